use std::sync::Arc;

use poem::{
    Endpoint, EndpointExt, Route, Server, get,
    error::NotFoundError,
    listener::TcpListener,
    middleware::{CookieJarManager, Tracing},
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::{
    config::Settings,
    error::not_found_page,
    handlers::{about, posts, users},
    migration::Migrator,
};

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, settings: Settings) -> Self {
        Self {
            db,
            settings: Arc::new(settings),
        }
    }
}

/// Opens the pool and brings the schema up to date.
pub async fn connect(settings: &Settings) -> Result<DatabaseConnection, DbErr> {
    let mut opts = ConnectOptions::new(settings.database_url.clone());
    opts.sqlx_logging(false);
    if settings.database_url.starts_with("sqlite::memory:") {
        // each pooled connection would otherwise see its own empty database
        opts.max_connections(1).min_connections(1);
    }

    let db = Database::connect(opts).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn routes(state: AppState) -> impl Endpoint {
    Route::new()
        .at("/", get(posts::index))
        .at("/group/:slug/", get(posts::group_posts))
        .at("/profile/:username/", get(posts::profile))
        .at("/posts/:post_id/", get(posts::post_detail))
        .at(
            "/posts/:post_id/edit",
            get(posts::edit_form).post(posts::edit_submit),
        )
        .at("/create/", get(posts::create_form).post(posts::create_submit))
        .at(
            "/auth/signup/",
            get(users::signup_form).post(users::signup_submit),
        )
        .at(
            "/auth/login/",
            get(users::login_form).post(users::login_submit),
        )
        .at("/auth/logout/", get(users::logout))
        .at("/about/author/", get(about::author))
        .at("/about/tech/", get(about::tech))
        .catch_error(|_: NotFoundError| async move { not_found_page() })
        .with(CookieJarManager::new())
        .with(Tracing)
        .data(state)
}

pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let db = connect(&settings).await?;
    let bind_addr = settings.bind_addr.clone();
    let state = AppState::new(db, settings);

    tracing::info!(%bind_addr, "listening");
    Server::new(TcpListener::bind(bind_addr))
        .run(routes(state))
        .await?;
    Ok(())
}
