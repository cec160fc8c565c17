//! Post listings joined with their author and group for display.

use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, SelectModel, Selector,
};

use crate::{
    entities::{group, post, user},
    error::AppResult,
};

/// A post row with everything a listing or detail page shows.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct PostCard {
    pub id: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_id: i32,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub group_id: Option<i32>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
}

impl PostCard {
    pub fn author_name(&self) -> String {
        user::display_name(
            &self.author_first_name,
            &self.author_last_name,
            &self.author_username,
        )
    }

    /// First 30 characters of the text, used as the page title.
    pub fn excerpt(&self) -> String {
        self.text.chars().take(30).collect()
    }

    pub fn created_display(&self) -> String {
        self.created_at.format("%d %b %Y").to_string()
    }
}

fn cards() -> Select<post::Entity> {
    post::Entity::find()
        .select_only()
        .column(post::Column::Id)
        .column(post::Column::Text)
        .column(post::Column::CreatedAt)
        .column(post::Column::AuthorId)
        .column(post::Column::GroupId)
        .column_as(user::Column::Username, "author_username")
        .column_as(user::Column::FirstName, "author_first_name")
        .column_as(user::Column::LastName, "author_last_name")
        .column_as(group::Column::Title, "group_title")
        .column_as(group::Column::Slug, "group_slug")
        .join(JoinType::InnerJoin, post::Relation::Author.def())
        .join(JoinType::LeftJoin, post::Relation::Group.def())
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
}

/// Every post, newest first.
pub fn all_posts() -> Selector<SelectModel<PostCard>> {
    cards().into_model::<PostCard>()
}

pub fn group_posts(group_id: i32) -> Selector<SelectModel<PostCard>> {
    cards()
        .filter(post::Column::GroupId.eq(group_id))
        .into_model::<PostCard>()
}

pub fn author_posts(author_id: i32) -> Selector<SelectModel<PostCard>> {
    cards()
        .filter(post::Column::AuthorId.eq(author_id))
        .into_model::<PostCard>()
}

pub async fn post_card(db: &DatabaseConnection, id: i32) -> AppResult<Option<PostCard>> {
    let card = cards()
        .filter(post::Column::Id.eq(id))
        .into_model::<PostCard>()
        .one(db)
        .await?;
    Ok(card)
}

pub async fn count_author_posts(db: &DatabaseConnection, author_id: i32) -> AppResult<u64> {
    let count = post::Entity::find()
        .filter(post::Column::AuthorId.eq(author_id))
        .count(db)
        .await?;
    Ok(count)
}

/// Groups for the post form's select, ordered by title.
pub async fn group_choices(db: &DatabaseConnection) -> AppResult<Vec<group::Model>> {
    let groups = group::Entity::find()
        .order_by_asc(group::Column::Title)
        .all(db)
        .await?;
    Ok(groups)
}
