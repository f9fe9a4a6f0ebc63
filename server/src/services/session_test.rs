use super::*;

// =============================================================================
// bytes_to_hex
// =============================================================================

#[test]
fn bytes_to_hex_pads_each_byte() {
    assert_eq!(bytes_to_hex(&[]), "");
    assert_eq!(bytes_to_hex(&[0x00, 0x0f, 0xa0, 0xff]), "000fa0ff");
}

// =============================================================================
// generate_token / hash_token
// =============================================================================

#[test]
fn generated_tokens_are_unique_32_byte_hex() {
    let (a, b) = (generate_token(), generate_token());
    assert_eq!(a.len(), 64);
    assert!(a.bytes().all(|c| c.is_ascii_digit() || (b'a'..=b'f').contains(&c)));
    assert_ne!(a, b);
}

#[test]
fn hash_token_matches_known_digest() {
    assert_eq!(hash_token("abc"), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
}

#[test]
fn hash_token_never_equals_token() {
    let token = generate_token();
    assert_ne!(hash_token(&token), token);
    assert_eq!(hash_token(&token), hash_token(&token));
}

// =============================================================================
// SessionTtl
// =============================================================================

#[test]
fn ttl_defaults_to_one_hour_and_seven_days() {
    let ttl = SessionTtl::from_lookup(|_| None);
    assert_eq!(ttl.access, Duration::hours(1));
    assert_eq!(ttl.refresh, Duration::days(7));
    assert_eq!(ttl, SessionTtl::default());
}

#[test]
fn ttl_reads_overrides() {
    let ttl = SessionTtl::from_lookup(|key| match key {
        "ACCESS_TOKEN_TTL_SECS" => Some(" 60 ".into()),
        "REFRESH_TOKEN_TTL_SECS" => Some("120".into()),
        _ => None,
    });
    assert_eq!(ttl.access, Duration::minutes(1));
    assert_eq!(ttl.refresh, Duration::minutes(2));
}

#[test]
fn ttl_ignores_zero_and_garbage() {
    let ttl = SessionTtl::from_lookup(|key| match key {
        "ACCESS_TOKEN_TTL_SECS" => Some("0".into()),
        "REFRESH_TOKEN_TTL_SECS" => Some("soon".into()),
        _ => None,
    });
    assert_eq!(ttl, SessionTtl::default());
}

// =============================================================================
// TokenPair
// =============================================================================

#[test]
fn token_pair_windows_follow_ttl() {
    let now = time::macros::datetime!(2025-03-01 12:00 UTC);
    let pair = TokenPair::issue(now, SessionTtl::default());
    assert_eq!(pair.issued_at, now);
    assert_eq!(pair.expires_at, time::macros::datetime!(2025-03-01 13:00 UTC));
    assert_eq!(pair.refresh_expires_at, time::macros::datetime!(2025-03-08 12:00 UTC));
    assert_ne!(pair.access_token, pair.refresh_token);
}

// =============================================================================
// Serialized shapes
// =============================================================================

fn user() -> SessionUser {
    SessionUser {
        id: Uuid::nil(),
        email: Some("a@example.com".into()),
        provider: "github".into(),
        username: Some("alice".into()),
        avatar_url: None,
    }
}

#[test]
fn issued_session_serializes_tokens_and_rfc3339_times() {
    let issued = IssuedSession {
        access_token: "acc".into(),
        refresh_token: "ref".into(),
        user: user(),
        issued_at: time::macros::datetime!(2025-03-01 12:00 UTC),
        expires_at: time::macros::datetime!(2025-03-01 13:00 UTC),
    };
    let json = serde_json::to_value(&issued).unwrap();
    assert_eq!(json["access_token"], "acc");
    assert_eq!(json["refresh_token"], "ref");
    assert_eq!(json["user"]["provider"], "github");
    assert_eq!(json["expires_at"], "2025-03-01T13:00:00Z");
}

#[test]
fn session_info_omits_tokens_and_role() {
    let active = ActiveSession {
        user: user(),
        is_admin: true,
        issued_at: time::macros::datetime!(2025-03-01 12:00 UTC),
        expires_at: time::macros::datetime!(2025-03-01 13:00 UTC),
    };
    let json = serde_json::to_value(SessionInfo::from(active)).unwrap();
    assert!(json.get("access_token").is_none());
    assert!(json.get("is_admin").is_none());
    assert_eq!(json["user"]["username"], "alice");
    assert!(json["user"]["avatar_url"].is_null());
}

// =============================================================================
// Live DB: refresh rotation
// =============================================================================

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn refresh_rotates_pair_once() {
    use crate::db::test_db::{integration_pool, seed_profile};

    let pool = integration_pool().await;
    let user_id = seed_profile(&pool, "rotator", false).await;
    let first = create_session(&pool, user_id, "github", SessionTtl::default()).await.unwrap();

    let second = refresh_session(&pool, &first.refresh_token, SessionTtl::default())
        .await
        .unwrap()
        .expect("fresh refresh token rotates");
    assert_ne!(second.access_token, first.access_token);
    assert_eq!(second.user.id, user_id);
    assert!(validate_session(&pool, &first.access_token).await.unwrap().is_none());
    assert!(validate_session(&pool, &second.access_token).await.unwrap().is_some());

    let replay = refresh_session(&pool, &first.refresh_token, SessionTtl::default()).await.unwrap();
    assert!(replay.is_none());
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn failed_rotation_keeps_old_refresh_token() {
    use crate::db::test_db::{integration_pool, seed_profile};

    let pool = integration_pool().await;
    let user_id = seed_profile(&pool, "unlucky", false).await;
    let issued = create_session(&pool, user_id, "github", SessionTtl::default()).await.unwrap();

    // Reject new session rows for this user only.
    let guard = format!("reject_sessions_{}", user_id.simple());
    sqlx::query(&format!(
        "CREATE FUNCTION {guard}() RETURNS trigger LANGUAGE plpgsql AS $$
         BEGIN
           IF NEW.user_id = '{user_id}' THEN RAISE EXCEPTION 'session insert rejected'; END IF;
           RETURN NEW;
         END $$"
    ))
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(&format!("CREATE TRIGGER {guard} BEFORE INSERT ON sessions FOR EACH ROW EXECUTE FUNCTION {guard}()"))
        .execute(&pool)
        .await
        .unwrap();

    let failed = refresh_session(&pool, &issued.refresh_token, SessionTtl::default()).await;

    sqlx::query(&format!("DROP TRIGGER {guard} ON sessions")).execute(&pool).await.unwrap();
    sqlx::query(&format!("DROP FUNCTION {guard}()")).execute(&pool).await.unwrap();

    assert!(failed.is_err());
    assert!(validate_session(&pool, &issued.access_token).await.unwrap().is_some());
    let retried = refresh_session(&pool, &issued.refresh_token, SessionTtl::default()).await.unwrap();
    assert!(retried.is_some(), "old refresh token survives a failed rotation");
}
