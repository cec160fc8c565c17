mod common;

use common::{TestApp, body, cards_on_page};

async fn app_with_thirteen_posts() -> TestApp {
    let app = TestApp::spawn().await;
    let author = app.create_user("Author").await;
    let group = app.create_group("test_group", "test_slug", "test_description").await;
    for i in 0..13 {
        app.create_post(&author, &format!("test_post {i}"), Some(&group)).await;
    }
    app
}

#[tokio::test]
async fn test_first_page_contains_ten_records() {
    let app = app_with_thirteen_posts().await;

    for path in ["/", "/group/test_slug/", "/profile/Author/"] {
        let html = body(app.get(path, None).await).await;
        assert_eq!(cards_on_page(&html), 10, "GET {path}");
    }
}

#[tokio::test]
async fn test_second_page_contains_three_records() {
    let app = app_with_thirteen_posts().await;

    for path in ["/?page=2", "/group/test_slug/?page=2", "/profile/Author/?page=2"] {
        let html = body(app.get(path, None).await).await;
        assert_eq!(cards_on_page(&html), 3, "GET {path}");
        assert!(html.contains("Page 2 of 2"));
    }
}

#[tokio::test]
async fn test_out_of_range_pages_clamp() {
    let app = app_with_thirteen_posts().await;

    for path in ["/?page=99", "/?page=99999999999999999999"] {
        let html = body(app.get(path, None).await).await;
        assert_eq!(cards_on_page(&html), 3, "GET {path}");
        assert!(html.contains("Page 2 of 2"));
    }

    for path in ["/?page=0", "/?page=-1", "/?page=abc"] {
        let html = body(app.get(path, None).await).await;
        assert_eq!(cards_on_page(&html), 10, "GET {path}");
        assert!(html.contains("Page 1 of 2"));
    }
}

#[tokio::test]
async fn test_first_page_holds_newest_posts() {
    let app = app_with_thirteen_posts().await;

    let html = body(app.get("/", None).await).await;
    assert!(html.contains("<p>test_post 12</p>"));
    assert!(!html.contains("<p>test_post 2</p>"));

    let html = body(app.get("/?page=2", None).await).await;
    assert!(html.contains("<p>test_post 0</p>"));
}

#[tokio::test]
async fn test_empty_listing_has_single_page() {
    let app = TestApp::spawn().await;

    let resp = app.get("/?page=3", None).await;
    resp.assert_status_is_ok();
    let html = body(resp).await;
    assert_eq!(cards_on_page(&html), 0);
    assert!(!html.contains("Page 1 of"));
}
