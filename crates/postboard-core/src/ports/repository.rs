use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Group, NewGroup, NewPost, Post, PostChanges, User};
use crate::error::RepoError;
use crate::pagination::{Page, PageRequest};

/// Generic repository trait shared by every entity.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Insert a user.
    async fn save(&self, user: User) -> Result<User, RepoError>;
}

/// Group repository.
#[async_trait]
pub trait GroupRepository: BaseRepository<Group, i64> {
    /// Find a group by its slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;

    /// All groups, oldest first.
    async fn list_all(&self) -> Result<Vec<Group>, RepoError>;

    /// Insert a group. Fails with `RepoError::Constraint` when the slug is taken.
    async fn create(&self, group: NewGroup) -> Result<Group, RepoError>;

    /// Delete a group, detaching its posts instead of deleting them.
    /// Returns the number of posts that were detached.
    async fn delete(&self, id: i64) -> Result<u64, RepoError>;
}

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(Uuid),
}

/// Post repository.
///
/// Listings are ordered by `pub_date` descending, then `id` descending.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i64> {
    /// Insert a post, stamping `pub_date` with the current time.
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    /// Replace the text and group of a stored post. Author and `pub_date` are kept.
    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError>;

    /// One page of the posts matching `filter`.
    async fn list(&self, filter: PostFilter, page: PageRequest) -> Result<Page<Post>, RepoError>;

    /// Total number of posts written by `author_id`.
    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError>;
}
