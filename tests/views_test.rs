mod common;

use common::{TestApp, body, cards_on_page};

#[tokio::test]
async fn test_group_page_shows_group() {
    let app = TestApp::spawn().await;
    let author = app.create_user("HasNoName").await;
    let group = app.create_group("Test group", "test-slug", "Test description").await;
    app.create_post(&author, "Test post", Some(&group)).await;

    let html = body(app.get("/group/test-slug/", None).await).await;
    assert!(html.contains("<h1>Test group</h1>"));
    assert!(html.contains("Test description"));
    assert_eq!(cards_on_page(&html), 1);
}

#[tokio::test]
async fn test_profile_page_shows_author_posts_only() {
    let app = TestApp::spawn().await;
    let author = app.create_user("HasNoName").await;
    let other = app.create_user("Other").await;
    app.create_post(&author, "Mine", None).await;
    app.create_post(&other, "Not mine", None).await;

    let html = body(app.get("/profile/HasNoName/", None).await).await;
    assert!(html.contains("All posts of HasNoName"));
    assert!(html.contains("Posts in total: 1"));
    assert!(html.contains("<p>Mine</p>"));
    assert!(!html.contains("Not mine"));
}

#[tokio::test]
async fn test_detail_page_shows_post() {
    let app = TestApp::spawn().await;
    let author = app.create_user("HasNoName").await;
    let group = app.create_group("Test group", "test-slug", "Test description").await;
    let post = app.create_post(&author, "Line one\nLine two", Some(&group)).await;
    app.create_post(&author, "Another", None).await;

    let html = body(app.get(&format!("/posts/{}/", post.id), None).await).await;
    assert!(html.contains("Line one<br/>Line two") || html.contains("Line one<br>Line two"));
    assert!(html.contains(r#"<a href="/group/test-slug/">Test group</a>"#));
    assert!(html.contains("Posts by this author: <span>2</span>"));
    assert!(!html.contains("edit post"), "anonymous visitors get no edit link");

    let html = body(app.get(&format!("/posts/{}/", post.id), Some(&author)).await).await;
    assert!(html.contains("edit post"));
}

#[tokio::test]
async fn test_post_text_is_escaped() {
    let app = TestApp::spawn().await;
    let author = app.create_user("HasNoName").await;
    let post = app.create_post(&author, "<script>alert(1)</script>", None).await;

    let html = body(app.get(&format!("/posts/{}/", post.id), None).await).await;
    assert!(!html.contains("<script>alert(1)</script>"));
}

#[tokio::test]
async fn test_post_form_lists_groups() {
    let app = TestApp::spawn().await;
    let author = app.create_user("HasNoName").await;
    let first = app.create_group("Alpha", "alpha", "a").await;
    let second = app.create_group("Beta", "beta", "b").await;
    let post = app.create_post(&author, "Test post", Some(&second)).await;

    let html = body(app.get("/create/", Some(&author)).await).await;
    assert!(html.contains(r#"<textarea name="text""#));
    assert!(html.contains(&format!(r#"<option value="{}">Alpha</option>"#, first.id)));
    assert!(html.contains(&format!(r#"<option value="{}">Beta</option>"#, second.id)));

    let html = body(app.get(&format!("/posts/{}/edit", post.id), Some(&author)).await).await;
    assert!(html.contains(&format!(r#"action="/posts/{}/edit""#, post.id)));
    assert!(html.contains(&format!(r#"<option value="{}" selected>Beta</option>"#, second.id)));
    assert!(html.contains(">Test post</textarea>"));
}

/// A grouped post shows up on the index, its group and its author's profile.
#[tokio::test]
async fn test_post_appears_on_listing_pages() {
    let app = TestApp::spawn().await;
    let author = app.create_user("HasNoName").await;
    let group = app.create_group("Test group", "test-slug", "Test description").await;
    app.create_group("Other group", "other-slug", "Elsewhere").await;
    let post = app.create_post(&author, "Test post", Some(&group)).await;

    let marker = format!(r#"data-post-id="{}""#, post.id);
    for path in ["/", "/group/test-slug/", "/profile/HasNoName/"] {
        let html = body(app.get(path, None).await).await;
        assert!(html.contains(&marker), "post missing from {path}");
    }

    let html = body(app.get("/group/other-slug/", None).await).await;
    assert!(!html.contains(&marker));
    assert_eq!(cards_on_page(&html), 0);
}

#[tokio::test]
async fn test_index_lists_newest_first() {
    let app = TestApp::spawn().await;
    let author = app.create_user("HasNoName").await;
    app.create_post(&author, "older", None).await;
    app.create_post(&author, "newer", None).await;

    let html = body(app.get("/", None).await).await;
    let newer = html.find("<p>newer</p>").unwrap();
    let older = html.find("<p>older</p>").unwrap();
    assert!(newer < older);
}

#[tokio::test]
async fn test_navigation_reflects_login_state() {
    let app = TestApp::spawn().await;
    let user = app.create_user("HasNoName").await;

    let html = body(app.get("/", None).await).await;
    assert!(html.contains(r#"href="/auth/login/""#));
    assert!(!html.contains(r#"href="/auth/logout/""#));

    let html = body(app.get("/", Some(&user)).await).await;
    assert!(html.contains(r#"href="/auth/logout/""#));
    assert!(html.contains(r#"href="/profile/HasNoName/""#));
}
