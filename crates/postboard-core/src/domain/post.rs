use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FormErrors;

/// Shown when a post is submitted without text.
pub const EMPTY_TEXT_MESSAGE: &str =
    "Posts without text are of no interest to anyone — please share your story!";

/// Length of the text preview used by `Post::summary`.
const SUMMARY_CHARS: usize = 15;

/// Post entity - a single authored text entry, optionally filed under a group.
///
/// `author_id` and `pub_date` are fixed at creation; only `text` and `group_id`
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
}

impl Post {
    /// The first characters of the text.
    pub fn summary(&self) -> String {
        self.text.chars().take(SUMMARY_CHARS).collect()
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Non-empty, trimmed post body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostText(String);

impl PostText {
    pub fn parse(raw: &str) -> Result<Self, FormErrors> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(FormErrors::single("text", EMPTY_TEXT_MESSAGE));
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Data for a post about to be stored. The storage layer assigns `id` and `pub_date`.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub text: PostText,
    pub group_id: Option<i64>,
}

/// The editable fields of a stored post.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: PostText,
    pub group_id: Option<i64>,
}
