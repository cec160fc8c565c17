//! Login sessions: argon2 password hashes and a signed JWT kept in a cookie.

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use poem::{
    FromRequest, IntoResponse, Request, RequestBody, Response,
    web::{Redirect, cookie::{Cookie, CookieJar, SameSite}},
};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    config::Settings,
    entities::user,
    error::{AppError, AppResult},
};

pub const SESSION_COOKIE: &str = "yatube_session";
pub const LOGIN_URL: &str = "/auth/login/";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Password(e.to_string()))
}

/// `false` for a wrong password and for a hash that doesn't parse.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            false
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    name: String,
    iat: usize,
    exp: usize,
}

pub fn issue_token(settings: &Settings, user: &user::Model) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        name: user.username.clone(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(settings.session_ttl_hours)).timestamp() as usize,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(settings.secret_key.as_bytes()),
    )?;
    Ok(token)
}

/// Returns the user id carried by a valid, unexpired token.
pub fn verify_token(settings: &Settings, token: &str) -> Option<i32> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret_key.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| tracing::debug!(error = %e, "rejected session token"))
    .ok()?;
    data.claims.sub.parse().ok()
}

pub fn start_session(jar: &CookieJar, token: String) {
    let mut cookie = Cookie::new_with_str(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    jar.add(cookie);
}

pub fn end_session(jar: &CookieJar) {
    let mut cookie = Cookie::new_with_str(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_max_age(std::time::Duration::ZERO);
    jar.add(cookie);
}

/// The logged in user as seen by templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub id: i32,
    pub username: String,
}

/// Extracts the user behind the session cookie, if any.
///
/// Bad, expired or orphaned tokens make the request anonymous rather than
/// failing it.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<Viewer>);

impl CurrentUser {
    pub fn viewer(&self) -> Option<&Viewer> {
        self.0.as_ref()
    }
}

impl<'a> FromRequest<'a> for CurrentUser {
    async fn from_request(req: &'a Request, _body: &mut RequestBody) -> poem::Result<Self> {
        let Some(state) = req.data::<AppState>() else {
            return Ok(CurrentUser(None));
        };
        let Some(cookie) = req.cookie().get(SESSION_COOKIE) else {
            return Ok(CurrentUser(None));
        };
        let Some(user_id) = verify_token(&state.settings, cookie.value_str()) else {
            return Ok(CurrentUser(None));
        };

        let user = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await
            .map_err(AppError::from)?;
        Ok(CurrentUser(user.map(|u| Viewer {
            id: u.id,
            username: u.username,
        })))
    }
}

/// Sends an anonymous visitor to the login page, remembering where they were going.
pub fn redirect_to_login(next: &str) -> Response {
    let next = urlencoding::encode(next).replace("%2F", "/");
    Redirect::see_other(format!("{LOGIN_URL}?next={next}")).into_response()
}

/// Only local absolute paths are followed after login. Browsers treat `\`
/// like `/`, so `/\host` is as foreign as `//host`.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if is_local_path(path) => path,
        _ => "/",
    }
}

fn is_local_path(path: &str) -> bool {
    let mut chars = path.chars();
    chars.next() == Some('/')
        && !matches!(chars.next(), Some('/' | '\\'))
        && !path.chars().any(|c| c == '\\' || c.is_control())
}
