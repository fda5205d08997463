//! Domain entities - the core business objects.

mod group;
mod identity;
mod post;
mod user;

pub use group::{Group, GroupSummary, NewGroup};
pub use identity::Identity;
pub use post::{EMPTY_TEXT_MESSAGE, NewPost, Post, PostChanges, PostText};
pub use user::{User, UserSummary};
