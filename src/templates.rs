use askama::Template;

use crate::{
    auth::Viewer,
    entities::{group, user},
    forms::{FormErrors, PostForm, SignupForm},
    pagination::Page,
    queries::PostCard,
};

#[derive(Template)]
#[template(path = "posts/index.html")]
pub struct IndexPage {
    pub viewer: Option<Viewer>,
    pub page: Page<PostCard>,
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
pub struct GroupPage {
    pub viewer: Option<Viewer>,
    pub group: group::Model,
    pub page: Page<PostCard>,
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
pub struct ProfilePage {
    pub viewer: Option<Viewer>,
    pub author: user::Model,
    pub page: Page<PostCard>,
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
pub struct PostDetailPage {
    pub viewer: Option<Viewer>,
    pub post: PostCard,
    pub author_post_count: u64,
}

impl PostDetailPage {
    pub fn can_edit(&self) -> bool {
        self.viewer.as_ref().map(|v| v.id) == Some(self.post.author_id)
    }
}

/// Shared by create and edit.
#[derive(Template)]
#[template(path = "posts/create_post.html")]
pub struct PostFormPage {
    pub viewer: Option<Viewer>,
    pub form: PostForm,
    pub groups: Vec<group::Model>,
    pub is_edit: bool,
    pub post_id: Option<i32>,
}

impl PostFormPage {
    pub fn is_selected<T: std::borrow::Borrow<i32>>(&self, group_id: T) -> bool {
        self.form.selected_group() == Some(*group_id.borrow())
    }

    pub fn action(&self) -> String {
        match self.post_id {
            Some(id) if self.is_edit => format!("/posts/{id}/edit"),
            _ => "/create/".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "users/login.html")]
pub struct LoginPage {
    pub viewer: Option<Viewer>,
    pub username: String,
    pub next: String,
    pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "users/signup.html")]
pub struct SignupPage {
    pub viewer: Option<Viewer>,
    pub form: SignupForm,
}

#[derive(Template, Default)]
#[template(path = "users/logged_out.html")]
pub struct LoggedOutPage {
    pub viewer: Option<Viewer>,
}

#[derive(Template, Default)]
#[template(path = "about/author.html")]
pub struct AboutAuthorPage {
    pub viewer: Option<Viewer>,
}

#[derive(Template, Default)]
#[template(path = "about/tech.html")]
pub struct AboutTechPage {
    pub viewer: Option<Viewer>,
}

#[derive(Template, Default)]
#[template(path = "core/404.html")]
pub struct NotFoundPage {
    pub viewer: Option<Viewer>,
}

#[derive(Template, Default)]
#[template(path = "core/500.html")]
pub struct ServerErrorPage {
    pub viewer: Option<Viewer>,
}
