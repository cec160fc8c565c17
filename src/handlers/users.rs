use poem::{
    IntoResponse, Response, handler,
    web::{Data, Form, Html, Query, Redirect, cookie::CookieJar},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;

use super::render;
use crate::{
    app::AppState,
    auth::{self, CurrentUser},
    entities::user,
    error::AppResult,
    forms::{BAD_CREDENTIALS, FormErrors, LoginFormData, SignupForm, SignupFormData},
    templates::{LoggedOutPage, LoginPage, SignupPage},
};

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[handler]
pub async fn signup_form(user: CurrentUser) -> AppResult<Html<String>> {
    render(SignupPage {
        viewer: user.0,
        form: SignupForm::default(),
    })
}

#[handler]
pub async fn signup_submit(
    state: Data<&AppState>,
    user: CurrentUser,
    Form(data): Form<SignupFormData>,
) -> AppResult<Response> {
    let mut form = SignupForm::from_data(data);
    let created = match form.clean(&state.db).await? {
        Some(clean) => form.save(&state.db, clean).await?,
        None => None,
    };
    let Some(created) = created else {
        return Ok(render(SignupPage {
            viewer: user.0,
            form,
        })?
        .into_response());
    };
    tracing::info!(user_id = created.id, username = %created.username, "user signed up");

    Ok(Redirect::see_other("/").into_response())
}

#[handler]
pub async fn login_form(
    user: CurrentUser,
    Query(query): Query<NextQuery>,
) -> AppResult<Html<String>> {
    render(LoginPage {
        viewer: user.0,
        username: String::new(),
        next: query.next.unwrap_or_default(),
        errors: FormErrors::default(),
    })
}

#[handler]
pub async fn login_submit(
    state: Data<&AppState>,
    jar: &CookieJar,
    user: CurrentUser,
    Form(data): Form<LoginFormData>,
) -> AppResult<Response> {
    let username = data.username.trim();
    let found = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(&state.db)
        .await?;

    let account = match found {
        Some(account) if auth::verify_password(&data.password, &account.password_hash) => account,
        _ => {
            tracing::warn!(username, "failed login");
            let mut errors = FormErrors::default();
            errors.add(FormErrors::NON_FIELD, BAD_CREDENTIALS);
            return Ok(render(LoginPage {
                viewer: user.0,
                username: username.to_string(),
                next: data.next.clone().unwrap_or_default(),
                errors,
            })?
            .into_response());
        }
    };

    let token = auth::issue_token(&state.settings, &account)?;
    auth::start_session(jar, token);
    tracing::info!(user_id = account.id, "user logged in");

    let target = auth::safe_next(data.next.as_deref().filter(|n| !n.is_empty()));
    Ok(Redirect::see_other(target).into_response())
}

#[handler]
pub async fn logout(jar: &CookieJar, user: CurrentUser) -> AppResult<Html<String>> {
    if let Some(viewer) = user.viewer() {
        tracing::info!(user_id = viewer.id, "user logged out");
    }
    auth::end_session(jar);
    render(LoggedOutPage { viewer: None })
}
