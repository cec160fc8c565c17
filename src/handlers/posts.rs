use chrono::Utc;
use poem::{
    IntoResponse, Request, Response, handler,
    web::{Data, Form, Html, Path, Query, Redirect},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use super::render;
use crate::{
    app::AppState,
    auth::{CurrentUser, Viewer, redirect_to_login},
    entities::{group, post, user},
    error::{AppError, AppResult},
    forms::{PostForm, PostFormData},
    pagination::{POSTS_PER_PAGE, PageQuery, load_page},
    queries,
    templates::{GroupPage, IndexPage, PostDetailPage, PostFormPage, ProfilePage},
};

/// Every post, ten per page.
#[handler]
pub async fn index(
    state: Data<&AppState>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let page = load_page(
        &state.db,
        queries::all_posts(),
        query.page.as_deref(),
        POSTS_PER_PAGE,
    )
    .await?;
    render(IndexPage {
        viewer: user.0,
        page,
    })
}

#[handler]
pub async fn group_posts(
    state: Data<&AppState>,
    user: CurrentUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let group = group::Entity::find()
        .filter(group::Column::Slug.eq(slug.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("group"))?;
    let page = load_page(
        &state.db,
        queries::group_posts(group.id),
        query.page.as_deref(),
        POSTS_PER_PAGE,
    )
    .await?;
    render(GroupPage {
        viewer: user.0,
        group,
        page,
    })
}

#[handler]
pub async fn profile(
    state: Data<&AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let author = user::Entity::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;
    let page = load_page(
        &state.db,
        queries::author_posts(author.id),
        query.page.as_deref(),
        POSTS_PER_PAGE,
    )
    .await?;
    render(ProfilePage {
        viewer: user.0,
        author,
        page,
    })
}

/// One post with its author and group.
#[handler]
pub async fn post_detail(
    state: Data<&AppState>,
    user: CurrentUser,
    Path(raw_id): Path<String>,
) -> AppResult<Html<String>> {
    let id = parse_post_id(&raw_id)?;
    let post = queries::post_card(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("post"))?;
    let author_post_count = queries::count_author_posts(&state.db, post.author_id).await?;
    render(PostDetailPage {
        viewer: user.0,
        post,
        author_post_count,
    })
}

/// Anonymous visitors are sent to log in first.
#[handler]
pub async fn create_form(
    req: &Request,
    state: Data<&AppState>,
    user: CurrentUser,
) -> AppResult<Response> {
    let Some(viewer) = user.0 else {
        return Ok(redirect_to_login(req.original_uri().path()));
    };
    form_page(&state, viewer, PostForm::default(), None).await
}

#[handler]
pub async fn create_submit(
    req: &Request,
    state: Data<&AppState>,
    user: CurrentUser,
    Form(data): Form<PostFormData>,
) -> AppResult<Response> {
    let Some(viewer) = user.0 else {
        return Ok(redirect_to_login(req.original_uri().path()));
    };

    let mut form = PostForm::from_data(data);
    let Some(clean) = form.clean(&state.db).await? else {
        return form_page(&state, viewer, form, None).await;
    };

    let created = post::ActiveModel {
        text: Set(clean.text),
        author_id: Set(viewer.id),
        group_id: Set(clean.group_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;
    tracing::info!(post_id = created.id, author_id = viewer.id, "post created");

    Ok(Redirect::see_other(format!("/profile/{}/", viewer.username)).into_response())
}

/// Only the author may edit; others land on the detail page.
#[handler]
pub async fn edit_form(
    req: &Request,
    state: Data<&AppState>,
    user: CurrentUser,
    Path(raw_id): Path<String>,
) -> AppResult<Response> {
    let existing = find_post(&state, &raw_id).await?;
    let viewer = match authorize_edit(req, user, &existing) {
        Ok(viewer) => viewer,
        Err(redirect) => return Ok(redirect),
    };
    form_page(&state, viewer, PostForm::from_post(&existing), Some(existing.id)).await
}

#[handler]
pub async fn edit_submit(
    req: &Request,
    state: Data<&AppState>,
    user: CurrentUser,
    Path(raw_id): Path<String>,
    Form(data): Form<PostFormData>,
) -> AppResult<Response> {
    let existing = find_post(&state, &raw_id).await?;
    let viewer = match authorize_edit(req, user, &existing) {
        Ok(viewer) => viewer,
        Err(redirect) => return Ok(redirect),
    };

    let mut form = PostForm::from_data(data);
    let Some(clean) = form.clean(&state.db).await? else {
        return form_page(&state, viewer, form, Some(existing.id)).await;
    };

    let post_id = existing.id;
    let mut am: post::ActiveModel = existing.into();
    am.text = Set(clean.text);
    am.group_id = Set(clean.group_id);
    am.update(&state.db).await?;
    tracing::info!(post_id, author_id = viewer.id, "post edited");

    Ok(Redirect::see_other(detail_url(post_id)).into_response())
}

fn detail_url(post_id: i32) -> String {
    format!("/posts/{post_id}/")
}

fn parse_post_id(raw: &str) -> AppResult<i32> {
    raw.parse().map_err(|_| AppError::not_found("post"))
}

async fn find_post(state: &AppState, raw_id: &str) -> AppResult<post::Model> {
    let id = parse_post_id(raw_id)?;
    post::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("post"))
}

/// Anonymous visitors go to login, everyone but the author to the detail page.
fn authorize_edit(
    req: &Request,
    user: CurrentUser,
    post: &post::Model,
) -> Result<Viewer, Response> {
    let Some(viewer) = user.0 else {
        return Err(redirect_to_login(req.original_uri().path()));
    };
    if viewer.id != post.author_id {
        tracing::warn!(
            post_id = post.id,
            user_id = viewer.id,
            "edit refused, not the author"
        );
        return Err(Redirect::see_other(detail_url(post.id)).into_response());
    }
    Ok(viewer)
}

async fn form_page(
    state: &AppState,
    viewer: Viewer,
    form: PostForm,
    post_id: Option<i32>,
) -> AppResult<Response> {
    let groups = queries::group_choices(&state.db).await?;
    let page = PostFormPage {
        viewer: Some(viewer),
        form,
        groups,
        is_edit: post_id.is_some(),
        post_id,
    };
    Ok(render(page)?.into_response())
}
