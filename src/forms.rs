//! HTML form payloads and their validation.
//!
//! Each form keeps what the user typed so a rejected submission can be
//! re-rendered with the values and inline errors.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, SqlErr,
};
use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::{
    auth,
    entities::{group, post, user},
    error::AppResult,
};

pub const EMPTY_TEXT: &str = "Post text must not be empty";
pub const INVALID_GROUP: &str = "Select a valid group";
pub const BAD_CREDENTIALS: &str = "Invalid username or password";
pub const USERNAME_TAKEN: &str = "A user with that username already exists";

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

/// Field name to messages. Form-wide errors live under `__all__`.
#[derive(Debug, Default, Clone)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub const NON_FIELD: &'static str = "__all__";

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn get(&self, field: impl AsRef<str>) -> &[String] {
        self.0.get(field.as_ref()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: impl AsRef<str>) -> bool {
        !self.get(field).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn merge(&mut self, errors: &ValidationErrors) {
        for (field, list) in errors.field_errors() {
            for err in list {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                self.add(&field, message);
            }
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostFormData {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
}

#[derive(Debug, Validate)]
struct PostInput {
    #[validate(length(min = 1, message = "Post text must not be empty"))]
    text: String,
}

/// Validated post fields, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i32>,
}

#[derive(Debug, Default, Clone)]
pub struct PostForm {
    pub text: String,
    pub group: String,
    pub errors: FormErrors,
}

impl PostForm {
    pub fn from_data(data: PostFormData) -> Self {
        Self {
            text: data.text,
            group: data.group,
            errors: FormErrors::default(),
        }
    }

    pub fn from_post(post: &post::Model) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
            errors: FormErrors::default(),
        }
    }

    pub fn selected_group(&self) -> Option<i32> {
        self.group.trim().parse().ok()
    }

    /// Validates the submission, recording errors on the form on failure.
    pub async fn clean(&mut self, db: &DatabaseConnection) -> AppResult<Option<CleanPost>> {
        let input = PostInput {
            text: self.text.trim().to_string(),
        };
        if let Err(errors) = input.validate() {
            self.errors.merge(&errors);
        }

        let raw_group = self.group.trim();
        let group_id = if raw_group.is_empty() {
            None
        } else {
            match raw_group.parse::<i32>() {
                Ok(id) if group::Entity::find_by_id(id).one(db).await?.is_some() => Some(id),
                _ => {
                    self.errors.add("group", INVALID_GROUP);
                    None
                }
            }
        };

        if !self.errors.is_empty() {
            return Ok(None);
        }
        Ok(Some(CleanPost {
            text: input.text,
            group_id,
        }))
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoginFormData {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SignupFormData {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Validate)]
struct SignupInput {
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters"))]
    first_name: String,
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters"))]
    last_name: String,
    #[validate(
        length(min = 1, max = 150, message = "Enter a username of at most 150 characters"),
        regex(
            path = *USERNAME_RE,
            message = "Usernames may contain only letters, digits and @/./+/-/_"
        )
    )]
    username: String,
    #[validate(email(message = "Enter a valid email address"))]
    email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    password1: String,
}

/// Validated signup fields; the password is still plain text here.
#[derive(Debug, Clone)]
pub struct CleanSignup {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Clone)]
pub struct SignupForm {
    pub data: SignupFormData,
    pub errors: FormErrors,
}

impl SignupForm {
    pub fn from_data(data: SignupFormData) -> Self {
        Self {
            data,
            errors: FormErrors::default(),
        }
    }

    pub async fn clean(&mut self, db: &DatabaseConnection) -> AppResult<Option<CleanSignup>> {
        let email = self.data.email.trim();
        let input = SignupInput {
            first_name: self.data.first_name.trim().to_string(),
            last_name: self.data.last_name.trim().to_string(),
            username: self.data.username.trim().to_string(),
            email: (!email.is_empty()).then(|| email.to_string()),
            password1: self.data.password1.clone(),
        };
        if let Err(errors) = input.validate() {
            self.errors.merge(&errors);
        }

        if self.data.password1 != self.data.password2 {
            self.errors.add("password2", "The two password fields didn't match");
        }

        if !self.errors.has("username") {
            let taken = user::Entity::find()
                .filter(user::Column::Username.eq(input.username.as_str()))
                .count(db)
                .await?
                > 0;
            if taken {
                self.errors.add("username", USERNAME_TAKEN);
            }
        }

        if !self.errors.is_empty() {
            return Ok(None);
        }
        Ok(Some(CleanSignup {
            first_name: input.first_name,
            last_name: input.last_name,
            username: input.username,
            email: input.email.unwrap_or_default(),
            password: input.password1,
        }))
    }

    /// Inserts the cleaned user. The username may have been claimed since
    /// `clean` looked; the unique index then rejects the row and the form
    /// gets the same error `clean` would have given.
    pub async fn save(
        &mut self,
        db: &DatabaseConnection,
        clean: CleanSignup,
    ) -> AppResult<Option<user::Model>> {
        let inserted = user::ActiveModel {
            username: Set(clean.username),
            email: Set(clean.email),
            first_name: Set(clean.first_name),
            last_name: Set(clean.last_name),
            password_hash: Set(auth::hash_password(&clean.password)?),
            date_joined: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await;

        match inserted {
            Ok(created) => Ok(Some(created)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::warn!(username = %self.data.username.trim(), "username claimed during signup");
                self.errors.add("username", USERNAME_TAKEN);
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}
