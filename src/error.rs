use askama::Template;
use poem::{Response, error::ResponseError, http::StatusCode, web::Html, IntoResponse};
use thiserror::Error;

use crate::templates::{NotFoundPage, ServerErrorPage};

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    #[error("password hashing error: {0}")]
    Password(String),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn not_found(what: &'static str) -> Self {
        AppError::NotFound(what)
    }
}

impl ResponseError for AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn as_response(&self) -> Response {
        match self {
            AppError::NotFound(what) => {
                tracing::debug!(what, "not found");
                not_found_page()
            }
            other => {
                tracing::error!(error = %other, "request failed");
                server_error_page()
            }
        }
    }
}

/// The 404 page, used both for missing objects and for unknown routes.
pub fn not_found_page() -> Response {
    render_status(NotFoundPage::default().render(), StatusCode::NOT_FOUND)
}

fn server_error_page() -> Response {
    render_status(
        ServerErrorPage::default().render(),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
}

fn render_status(rendered: askama::Result<String>, status: StatusCode) -> Response {
    match rendered {
        Ok(body) => Html(body).with_status(status).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to render error page");
            Response::builder()
                .status(status)
                .body(status.canonical_reason().unwrap_or_default())
        }
    }
}
