//! Write side: creating and editing posts.
//!
//! Every entry point returns a [`Flow`]: either a form page to show (possibly with
//! inline errors) or a redirect. Anonymous writers are sent to the login page and
//! non-authors are sent back to the post; neither is treated as an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{Group, Identity, NewPost, Post, PostChanges, PostText, User};
use crate::error::{DomainError, FormErrors};
use crate::policy;
use crate::ports::{BaseRepository, GroupRepository, PostRepository, UserRepository};

/// Shown when the submitted group slug matches no group.
pub const INVALID_GROUP_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Where new posts are written.
pub const NEW_POST_PATH: &str = "/new/";

pub fn post_path(username: &str, post_id: i64) -> String {
    format!("/{username}/{post_id}/")
}

pub fn edit_post_path(username: &str, post_id: i64) -> String {
    format!("/{username}/{post_id}/edit/")
}

/// Raw post form fields as submitted. `group` is a group slug; blank means none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
}

impl PostForm {
    pub fn new(text: impl Into<String>, group: Option<&str>) -> Self {
        Self {
            text: text.into(),
            group: group.map(str::to_string),
        }
    }

    /// A form pre-filled with a stored post.
    pub fn from_post(post: &Post, group: Option<&Group>) -> Self {
        Self {
            text: post.text.clone(),
            group: group.map(|g| g.slug.clone()),
        }
    }

    fn group_slug(&self) -> Option<&str> {
        self.group
            .as_deref()
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
    }
}

/// Everything needed to show the post form.
#[derive(Debug, Clone, Serialize)]
pub struct FormPage {
    pub form: PostForm,
    pub errors: FormErrors,
    /// Selectable groups.
    pub groups: Vec<Group>,
    /// The post being edited, if any.
    pub post: Option<Post>,
}

/// Where to send the client instead of showing a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    Index,
    PostDetail { username: String, post_id: i64 },
    Login { next: String },
}

impl Redirect {
    pub fn login(next: impl Into<String>) -> Self {
        Self::Login { next: next.into() }
    }

    /// The `Location` to send, given the login page path.
    pub fn location(&self, login_url: &str) -> String {
        match self {
            Redirect::Index => "/".to_string(),
            Redirect::PostDetail { username, post_id } => post_path(username, *post_id),
            Redirect::Login { next } => {
                let query = serde_urlencoded::to_string([("next", next.as_str())])
                    .unwrap_or_default();
                let separator = if login_url.contains('?') { '&' } else { '?' };
                format!("{login_url}{separator}{query}")
            }
        }
    }
}

/// Outcome of a workflow step.
#[derive(Debug, Clone)]
pub enum Flow<T> {
    Render(T),
    Redirect(Redirect),
}

impl<T> Flow<T> {
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            Flow::Redirect(redirect) => Some(redirect),
            Flow::Render(_) => None,
        }
    }
}

/// Validated form contents.
struct CleanedPost {
    text: PostText,
    group_id: Option<i64>,
}

/// Creates and edits posts on behalf of the acting identity.
pub struct PostSubmission {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    posts: Arc<dyn PostRepository>,
}

impl PostSubmission {
    pub fn new(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        posts: Arc<dyn PostRepository>,
    ) -> Self {
        Self {
            users,
            groups,
            posts,
        }
    }

    /// An empty form for a signed-in user.
    pub async fn new_post_form(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Flow<FormPage>, DomainError> {
        if identity.is_none() {
            return Ok(Flow::Redirect(Redirect::login(NEW_POST_PATH)));
        }
        let page = self.form_page(PostForm::default(), FormErrors::new(), None).await?;
        Ok(Flow::Render(page))
    }

    /// Store a new post written by `identity`, then go to the global feed.
    pub async fn create_post(
        &self,
        identity: Option<&Identity>,
        form: PostForm,
    ) -> Result<Flow<FormPage>, DomainError> {
        let Some(identity) = identity else {
            return Ok(Flow::Redirect(Redirect::login(NEW_POST_PATH)));
        };

        let cleaned = match self.clean(&form).await {
            Ok(cleaned) => cleaned,
            Err(DomainError::Validation(errors)) => {
                return Ok(Flow::Render(self.form_page(form, errors, None).await?));
            }
            Err(e) => return Err(e),
        };

        let post = self
            .posts
            .create(NewPost {
                author_id: identity.user_id,
                text: cleaned.text,
                group_id: cleaned.group_id,
            })
            .await?;

        tracing::info!(post_id = post.id, author = %identity.username, "Post created");
        Ok(Flow::Redirect(Redirect::Index))
    }

    /// The form pre-filled with the post, for its author only.
    pub async fn edit_post_form(
        &self,
        identity: Option<&Identity>,
        username: &str,
        post_id: i64,
    ) -> Result<Flow<FormPage>, DomainError> {
        let post = match self.editable(identity, username, post_id).await? {
            Flow::Render(post) => post,
            Flow::Redirect(redirect) => return Ok(Flow::Redirect(redirect)),
        };

        let group = match post.group_id {
            Some(group_id) => self.groups.find_by_id(group_id).await?,
            None => None,
        };
        let form = PostForm::from_post(&post, group.as_ref());
        let page = self.form_page(form, FormErrors::new(), Some(post)).await?;
        Ok(Flow::Render(page))
    }

    /// Replace the text and group of a post, then go to the post page.
    pub async fn edit_post(
        &self,
        identity: Option<&Identity>,
        username: &str,
        post_id: i64,
        form: PostForm,
    ) -> Result<Flow<FormPage>, DomainError> {
        let post = match self.editable(identity, username, post_id).await? {
            Flow::Render(post) => post,
            Flow::Redirect(redirect) => return Ok(Flow::Redirect(redirect)),
        };

        let cleaned = match self.clean(&form).await {
            Ok(cleaned) => cleaned,
            Err(DomainError::Validation(errors)) => {
                return Ok(Flow::Render(self.form_page(form, errors, Some(post)).await?));
            }
            Err(e) => return Err(e),
        };

        let updated = self
            .posts
            .update(
                post.id,
                PostChanges {
                    text: cleaned.text,
                    group_id: cleaned.group_id,
                },
            )
            .await?;

        tracing::info!(post_id = updated.id, author = %username, "Post updated");
        Ok(Flow::Redirect(Redirect::PostDetail {
            username: username.to_string(),
            post_id: updated.id,
        }))
    }

    /// Resolve the post at `/<username>/<post_id>/` and check that `identity` wrote it.
    async fn editable(
        &self,
        identity: Option<&Identity>,
        username: &str,
        post_id: i64,
    ) -> Result<Flow<Post>, DomainError> {
        if identity.is_none() {
            return Ok(Flow::Redirect(Redirect::login(edit_post_path(
                username, post_id,
            ))));
        }

        let author = self.find_author(username).await?;
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .filter(|post| post.author_id == author.id)
            .ok_or_else(|| DomainError::not_found("Post", post_id))?;

        if !policy::can_edit(identity, &post) {
            tracing::debug!(post_id, "Edit denied to non-author");
            return Ok(Flow::Redirect(Redirect::PostDetail {
                username: author.username,
                post_id,
            }));
        }

        Ok(Flow::Render(post))
    }

    async fn find_author(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("User", username))
    }

    /// Check the text and resolve the group slug, collecting every field error.
    async fn clean(&self, form: &PostForm) -> Result<CleanedPost, DomainError> {
        let mut errors = FormErrors::new();

        let text = match PostText::parse(&form.text) {
            Ok(text) => Some(text),
            Err(e) => {
                errors.merge(e);
                None
            }
        };

        let group_id = match form.group_slug() {
            Some(slug) => match self.groups.find_by_slug(slug).await? {
                Some(group) => Some(group.id),
                None => {
                    errors.add("group", INVALID_GROUP_MESSAGE);
                    None
                }
            },
            None => None,
        };

        match text {
            Some(text) if errors.is_empty() => Ok(CleanedPost { text, group_id }),
            _ => Err(DomainError::Validation(errors)),
        }
    }

    async fn form_page(
        &self,
        form: PostForm,
        errors: FormErrors,
        post: Option<Post>,
    ) -> Result<FormPage, DomainError> {
        Ok(FormPage {
            form,
            errors,
            groups: self.groups.list_all().await?,
            post,
        })
    }
}
