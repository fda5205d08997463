//! Who may change what.

use crate::domain::{Identity, Post};

/// True iff someone is signed in and wrote `post`.
pub fn can_edit(identity: Option<&Identity>, post: &Post) -> bool {
    identity.is_some_and(|identity| identity.user_id == post.author_id)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn post_by(author_id: Uuid) -> Post {
        Post {
            id: 1,
            text: "Test text".to_string(),
            pub_date: Utc::now(),
            author_id,
            group_id: None,
        }
    }

    #[test]
    fn test_author_can_edit() {
        let author = Identity::new(Uuid::new_v4(), "author");
        assert!(can_edit(Some(&author), &post_by(author.user_id)));
    }

    #[test]
    fn test_other_user_cannot_edit() {
        let author = Identity::new(Uuid::new_v4(), "author");
        let other = Identity::new(Uuid::new_v4(), "other");
        assert!(!can_edit(Some(&other), &post_by(author.user_id)));
    }

    #[test]
    fn test_anonymous_cannot_edit() {
        assert!(!can_edit(None, &post_by(Uuid::new_v4())));
    }
}
