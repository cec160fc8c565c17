#![allow(dead_code)]

use chrono::{Duration, Utc};
use poem::{
    EndpointExt, Request, RequestParts,
    endpoint::BoxEndpoint,
    http,
    test::{TestClient, TestResponse},
};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use yatube::{
    app::{self, AppState},
    auth::{self, SESSION_COOKIE},
    config::Settings,
    entities::{group, post, user},
};

pub const PASSWORD: &str = "s3cret-pass";

pub struct TestApp {
    pub cli: TestClient<BoxEndpoint<'static>>,
    pub state: AppState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let settings = Settings::for_tests();
        let db = app::connect(&settings)
            .await
            .expect("Failed to set up test database");
        let state = AppState::new(db, settings);
        let cli = TestClient::new(
            app::routes(state.clone())
                .before(|req| async move { Ok(with_original_uri(req)) })
                .map_to_response()
                .boxed(),
        );
        Self { cli, state }
    }

    pub async fn create_user(&self, username: &str) -> user::Model {
        user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(format!("{username}@example.com")),
            first_name: Set(String::new()),
            last_name: Set(String::new()),
            password_hash: Set(auth::hash_password(PASSWORD).unwrap()),
            date_joined: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.state.db)
        .await
        .expect("Failed to create user")
    }

    pub async fn create_group(&self, title: &str, slug: &str, description: &str) -> group::Model {
        group::ActiveModel {
            title: Set(title.to_string()),
            slug: Set(slug.to_string()),
            description: Set(description.to_string()),
            ..Default::default()
        }
        .insert(&self.state.db)
        .await
        .expect("Failed to create group")
    }

    pub async fn create_post(
        &self,
        author: &user::Model,
        text: &str,
        group: Option<&group::Model>,
    ) -> post::Model {
        // spread timestamps so "newest first" is unambiguous
        let offset = self.post_count().await as i64;
        post::ActiveModel {
            text: Set(text.to_string()),
            author_id: Set(author.id),
            group_id: Set(group.map(|g| g.id)),
            created_at: Set(Utc::now() - Duration::hours(1000) + Duration::seconds(offset)),
            ..Default::default()
        }
        .insert(&self.state.db)
        .await
        .expect("Failed to create post")
    }

    pub async fn post_count(&self) -> u64 {
        post::Entity::find().count(&self.state.db).await.unwrap()
    }

    pub async fn find_post(&self, id: i32) -> post::Model {
        post::Entity::find_by_id(id)
            .one(&self.state.db)
            .await
            .unwrap()
            .expect("post vanished")
    }

    pub fn session_cookie(&self, user: &user::Model) -> String {
        let token = auth::issue_token(&self.state.settings, user).unwrap();
        format!("{SESSION_COOKIE}={token}")
    }

    /// GET as `user`, or anonymously.
    pub async fn get(&self, path: &str, user: Option<&user::Model>) -> TestResponse {
        let mut req = self.cli.get(path);
        if let Some(user) = user {
            req = req.header("cookie", self.session_cookie(user));
        }
        req.send().await
    }

    pub async fn post_form(
        &self,
        path: &str,
        user: Option<&user::Model>,
        form: &[(&str, &str)],
    ) -> TestResponse {
        let mut req = self.cli.post(path).form(&form);
        if let Some(user) = user {
            req = req.header("cookie", self.session_cookie(user));
        }
        req.send().await
    }
}

pub async fn body(resp: TestResponse) -> String {
    resp.0.into_body().into_string().await.unwrap()
}

pub fn title_of(html: &str) -> &str {
    let start = html.find("<title>").map(|i| i + "<title>".len()).unwrap_or(0);
    let end = html[start..].find("</title>").map(|i| start + i).unwrap_or(start);
    html[start..end].trim()
}

/// Number of post cards rendered on a page.
pub fn cards_on_page(html: &str) -> usize {
    html.matches(r#"<article class="post""#).count()
}

/// `TestClient` builds requests without an original URI (it defaults to `/`),
/// unlike a real server; rebuild the request so `original_uri()` is the request URI.
fn with_original_uri(req: Request) -> Request {
    let local_addr = req.local_addr().clone();
    let remote_addr = req.remote_addr().clone();
    let scheme = req.scheme().clone();
    let (parts, body) = req.into_parts();
    let mut http_parts = http::Request::new(()).into_parts().0;
    http_parts.method = parts.method;
    http_parts.uri = parts.uri;
    http_parts.version = parts.version;
    http_parts.headers = parts.headers;
    http_parts.extensions = parts.extensions;
    Request::from_parts(
        RequestParts::from((http_parts, local_addr, remote_addr, scheme)),
        body,
    )
}

pub fn location(resp: &TestResponse) -> String {
    resp.0
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
