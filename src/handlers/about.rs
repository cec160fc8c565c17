use poem::{handler, web::Html};

use super::render;
use crate::{
    auth::CurrentUser,
    error::AppResult,
    templates::{AboutAuthorPage, AboutTechPage},
};

#[handler]
pub async fn author(user: CurrentUser) -> AppResult<Html<String>> {
    render(AboutAuthorPage { viewer: user.0 })
}

#[handler]
pub async fn tech(user: CurrentUser) -> AppResult<Html<String>> {
    render(AboutTechPage { viewer: user.0 })
}
