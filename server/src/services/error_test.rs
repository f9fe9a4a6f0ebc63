use super::*;

#[test]
fn row_not_found_maps_to_not_found() {
    assert!(matches!(StoreError::from(sqlx::Error::RowNotFound), StoreError::NotFound));
}

#[test]
fn non_database_errors_stay_database() {
    let err = StoreError::from(sqlx::Error::PoolTimedOut);
    assert!(matches!(err, StoreError::Database(_)));
}

#[test]
fn schema_missing_displays_raw_message() {
    let err = StoreError::SchemaMissing(r#"relation "subscriptions" does not exist"#.into());
    assert_eq!(err.to_string(), r#"relation "subscriptions" does not exist"#);
}

#[test]
fn required_trims_and_rejects_blank() {
    assert_eq!(required("name", "  Netflix ").unwrap(), "Netflix");
    let err = required("name", "   ").unwrap_err();
    assert!(matches!(err, StoreError::Invalid { field: "name", .. }));
    assert_eq!(err.to_string(), "invalid name: must not be empty");
}

#[test]
fn optional_folds_blank_to_none() {
    assert_eq!(optional(Some("  ")), None);
    assert_eq!(optional(None), None);
    assert_eq!(optional(Some(" x ")), Some("x".into()));
}
