//! Fixed-size pagination over sea-orm selects.
//!
//! Page numbers are 1-based. Whatever arrives in `?page=` is resolved to a
//! page that exists: garbage and numbers below one land on the first page,
//! numbers past the end land on the last one. An empty list still has one
//! (empty) page.

use sea_orm::{DatabaseConnection, PaginatorTrait, Selector, SelectorTrait};
use serde::Deserialize;

use crate::error::AppResult;

pub const POSTS_PER_PAGE: u64 = 10;

/// `?page=` query string. Kept as a raw string so non-numbers don't 400.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Maps a raw page parameter onto `1..=num_pages`.
pub fn resolve_page_number(raw: Option<&str>, num_pages: u64) -> u64 {
    let last = num_pages.max(1);
    let Some(raw) = raw.map(str::trim) else {
        return 1;
    };
    match raw.parse::<i128>() {
        Ok(n) if n < 1 => 1,
        Ok(n) if n > i128::from(last) => last,
        Ok(n) => n as u64,
        // too long even for i128: still a number, so clamp by sign
        Err(_) if is_integer(raw) => {
            if raw.starts_with('-') {
                1
            } else {
                last
            }
        }
        Err(_) => 1,
    }
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_page_number(&self) -> u64 {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_page_number(&self) -> u64 {
        (self.number + 1).min(self.num_pages)
    }
}

/// Counts the rows behind `selector` and loads the requested page of it.
pub async fn load_page<S>(
    db: &DatabaseConnection,
    selector: Selector<S>,
    raw_page: Option<&str>,
    per_page: u64,
) -> AppResult<Page<S::Item>>
where
    S: SelectorTrait + Send + Sync + 'static,
{
    let paginator = selector.paginate(db, per_page);
    let counts = paginator.num_items_and_pages().await?;
    let num_pages = counts.number_of_pages.max(1);
    let number = resolve_page_number(raw_page, num_pages);
    let items = paginator.fetch_page(number - 1).await?;

    Ok(Page {
        items,
        number,
        num_pages,
        total_items: counts.number_of_items,
    })
}
