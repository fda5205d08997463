//! Read side: the global feed, group feeds, author profiles and post pages.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Group, GroupSummary, Post, User, UserSummary};
use crate::error::{DomainError, RepoError};
use crate::pagination::{Page, PageRequest};
use crate::ports::{BaseRepository, GroupRepository, PostFilter, PostRepository, UserRepository};

/// A post as it appears in a listing, with its author and group resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedEntry {
    #[serde(flatten)]
    pub post: Post,
    pub author: UserSummary,
    pub group: Option<GroupSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page: Page<FeedEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorProfile {
    pub author: User,
    pub page: Page<FeedEntry>,
    /// Every post by the author, not just the ones on this page.
    pub post_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: FeedEntry,
    pub author: User,
    pub post_count: u64,
}

/// Assembles paginated post listings.
pub struct FeedService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    posts: Arc<dyn PostRepository>,
}

impl FeedService {
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

    /// All posts, newest first.
    pub async fn global_feed(&self, page: PageRequest) -> Result<Page<FeedEntry>, DomainError> {
        let posts = self.posts.list(PostFilter::All, page).await?;
        self.resolve(posts).await
    }

    /// Posts filed under the group with `slug`.
    pub async fn group_feed(&self, slug: &str, page: PageRequest) -> Result<GroupFeed, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("Group", slug))?;

        let posts = self.posts.list(PostFilter::Group(group.id), page).await?;
        let page = self.resolve(posts).await?;

        tracing::debug!(slug, page = page.page_number, items = page.len(), "Group feed assembled");
        Ok(GroupFeed { group, page })
    }

    /// Posts written by `username`, plus their total count.
    pub async fn author_profile(
        &self,
        username: &str,
        page: PageRequest,
    ) -> Result<AuthorProfile, DomainError> {
        let author = self.find_author(username).await?;

        let posts = self.posts.list(PostFilter::Author(author.id), page).await?;
        let post_count = self.posts.count_by_author(author.id).await?;
        let page = self.resolve(posts).await?;

        Ok(AuthorProfile {
            author,
            page,
            post_count,
        })
    }

    /// A single post, addressed through its author's username.
    pub async fn post_detail(&self, username: &str, post_id: i64) -> Result<PostDetail, DomainError> {
        let author = self.find_author(username).await?;
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .filter(|post| post.author_id == author.id)
            .ok_or_else(|| DomainError::not_found("Post", post_id))?;

        let group = match post.group_id {
            Some(group_id) => self.groups.find_by_id(group_id).await?,
            None => None,
        };
        let post_count = self.posts.count_by_author(author.id).await?;

        Ok(PostDetail {
            post: FeedEntry {
                author: UserSummary::from(&author),
                group: group.as_ref().map(GroupSummary::from),
                post,
            },
            author,
            post_count,
        })
    }

    async fn find_author(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("User", username))
    }

    /// Attach author and group summaries, looking each one up once per page.
    async fn resolve(&self, page: Page<Post>) -> Result<Page<FeedEntry>, DomainError> {
        let mut authors: HashMap<Uuid, UserSummary> = HashMap::new();
        let mut groups: HashMap<i64, Option<GroupSummary>> = HashMap::new();

        for post in &page.items {
            if !authors.contains_key(&post.author_id) {
                let author = self.users.find_by_id(post.author_id).await?.ok_or_else(|| {
                    RepoError::Constraint(format!("post {} has no author", post.id))
                })?;
                authors.insert(post.author_id, UserSummary::from(&author));
            }
            if let Some(group_id) = post.group_id {
                if !groups.contains_key(&group_id) {
                    let group = self.groups.find_by_id(group_id).await?;
                    groups.insert(group_id, group.as_ref().map(GroupSummary::from));
                }
            }
        }

        Ok(page.map(|post| FeedEntry {
            author: authors[&post.author_id].clone(),
            group: post
                .group_id
                .and_then(|group_id| groups.get(&group_id).cloned().flatten()),
            post,
        }))
    }
}
