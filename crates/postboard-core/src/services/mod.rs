//! Application services built on the ports.

mod feed;
mod submission;

pub use feed::{AuthorProfile, FeedEntry, FeedService, GroupFeed, PostDetail};
pub use submission::{
    Flow, FormPage, INVALID_GROUP_MESSAGE, NEW_POST_PATH, PostForm, PostSubmission, Redirect,
    edit_post_path, post_path,
};
