use askama::Template;
use poem::web::Html;

use crate::error::AppResult;

pub mod about;
pub mod posts;
pub mod users;

pub(crate) fn render(page: impl Template) -> AppResult<Html<String>> {
    Ok(Html(page.render()?))
}
