use super::*;

fn input(title: &str, slug: &str) -> PostInput {
    PostInput {
        title: title.into(),
        slug: slug.into(),
        summary: " short ".into(),
        content: "# Body\n".into(),
        thumbnail_url: Some(String::new()),
        tags: Vec::new(),
    }
}

// =============================================================================
// slugify
// =============================================================================

#[test]
fn slugify_lowercases_and_dashes() {
    assert_eq!(slugify("Hello, World!"), "hello-world");
    assert_eq!(slugify("  --Rust  2024-- "), "rust-2024");
}

#[test]
fn slugify_keeps_hangul() {
    assert_eq!(slugify("구독 관리 Tips"), "구독-관리-tips");
}

#[test]
fn slugify_drops_everything_else() {
    assert_eq!(slugify("!!!"), "");
    assert_eq!(slugify("café"), "caf");
}

#[test]
fn slugify_matches_shared_cases() {
    for line in include_str!("../../../testdata/slug_cases.tsv").lines().filter(|l| !l.is_empty()) {
        let (title, expected) = line.split_once('\t').unwrap();
        assert_eq!(slugify(title), expected, "{title:?}");
    }
}

// =============================================================================
// PostInput::validate
// =============================================================================

#[test]
fn blank_slug_comes_from_title() {
    let draft = input("My First Post", "  ").validate().unwrap();
    assert_eq!(draft.slug, "my-first-post");
    assert_eq!(draft.summary, "short");
    assert_eq!(draft.thumbnail_url, None);
}

#[test]
fn explicit_slug_is_normalized() {
    let draft = input("Title", "Custom Slug").validate().unwrap();
    assert_eq!(draft.slug, "custom-slug");
}

#[test]
fn blank_title_is_rejected() {
    assert!(matches!(input(" ", "x").validate(), Err(StoreError::Invalid { field: "title", .. })));
}

#[test]
fn unsluggable_title_is_rejected() {
    assert!(matches!(input("???", "").validate(), Err(StoreError::Invalid { field: "slug", .. })));
}

#[test]
fn duplicate_tags_are_dropped_in_order() {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let mut raw = input("Tagged", "");
    raw.tags = vec![a, b, a, b];
    assert_eq!(raw.validate().unwrap().tags, vec![a, b]);
}

#[test]
fn post_input_tolerates_missing_optional_fields() {
    let raw: PostInput = serde_json::from_str(r#"{"title":"Only a title"}"#).unwrap();
    let draft = raw.validate().unwrap();
    assert_eq!(draft.slug, "only-a-title");
    assert!(draft.tags.is_empty());
}

#[test]
fn post_serializes_author_and_tags() {
    let tag = Uuid::new_v4();
    let post = BlogPost {
        id: Uuid::nil(),
        title: "T".into(),
        slug: "t".into(),
        summary: String::new(),
        content: String::new(),
        thumbnail_url: None,
        author_id: None,
        tags: vec![tag],
        author: Some(PostAuthor { username: Some("admin".into()), avatar_url: None }),
        created_at: time::macros::datetime!(2025-02-01 09:00 UTC),
    };
    let json = serde_json::to_value(&post).unwrap();
    assert_eq!(json["tags"][0], tag.to_string());
    assert_eq!(json["author"]["username"], "admin");
}

// =============================================================================
// live database
// =============================================================================

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn post_crud_with_author_join_and_slug_conflict() {
    use crate::db::test_db::{integration_pool, seed_profile};

    let pool = integration_pool().await;
    let admin = seed_profile(&pool, "editor", true).await;
    let tag = create_tag(&pool, &TagInput { name: "news".into() }).await.unwrap();
    assert!(matches!(create_tag(&pool, &TagInput { name: "news".into() }).await, Err(StoreError::Conflict(_))));

    let mut raw = input("Launch Day", "");
    raw.tags = vec![tag.id];
    let draft = raw.validate().unwrap();
    let post = create_post(&pool, admin, &draft).await.unwrap();
    assert_eq!(post.author.as_ref().and_then(|a| a.username.as_deref()), Some("editor"));
    assert_eq!(post.tags, vec![tag.id]);

    assert!(matches!(create_post(&pool, admin, &draft).await, Err(StoreError::Conflict(_))));

    let by_slug = post_by_slug(&pool, "launch-day").await.unwrap();
    assert_eq!(by_slug.id, post.id);

    let edited = update_post(&pool, post.id, &input("Launch Day", "launch-day-2").validate().unwrap()).await.unwrap();
    assert_eq!(edited.slug, "launch-day-2");
    assert_eq!(edited.author_id, Some(admin));

    delete_post(&pool, post.id).await.unwrap();
    assert!(matches!(post_by_id(&pool, post.id).await, Err(StoreError::NotFound)));
    assert!(list_posts(&pool).await.unwrap().is_empty());
}
