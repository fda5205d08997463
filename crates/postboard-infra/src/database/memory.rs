//! In-memory repositories - used when no database is configured, and in tests.
//!
//! All three repositories share one set of tables, so foreign keys behave like the
//! PostgreSQL schema: posts need an existing author and group, and deleting a group
//! detaches its posts. Data is lost on process restart.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use postboard_core::domain::{Group, NewGroup, NewPost, Post, PostChanges, User};
use postboard_core::error::RepoError;
use postboard_core::pagination::{Page, PageRequest};
use postboard_core::ports::{
    BaseRepository, GroupRepository, PostFilter, PostRepository, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, Post>,
    last_group_id: i64,
    last_post_id: i64,
}

impl Tables {
    fn check_group(&self, group_id: Option<i64>) -> Result<(), RepoError> {
        match group_id {
            Some(id) if !self.groups.contains_key(&id) => Err(RepoError::Constraint(format!(
                "group {id} does not exist"
            ))),
            _ => Ok(()),
        }
    }
}

/// Shared table store handing out repositories.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn groups(&self) -> InMemoryGroupRepository {
        InMemoryGroupRepository {
            tables: self.tables.clone(),
        }
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            tables: self.tables.clone(),
        }
    }
}

pub struct InMemoryUserRepository {
    tables: Arc<RwLock<Tables>>,
}

pub struct InMemoryGroupRepository {
    tables: Arc<RwLock<Tables>>,
}

pub struct InMemoryPostRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .users
            .values()
            .any(|u| u.username == user.username || u.id == user.id);
        if taken {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl BaseRepository<Group, i64> for InMemoryGroupRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, RepoError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
        Ok(self.tables.read().await.groups.values().cloned().collect())
    }

    async fn create(&self, group: NewGroup) -> Result<Group, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.groups.values().any(|g| g.slug == group.slug) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        tables.last_group_id += 1;
        let group = Group {
            id: tables.last_group_id,
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn delete(&self, id: i64) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.groups.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        let mut detached = 0;
        for post in tables.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
                detached += 1;
            }
        }

        tracing::info!(group_id = id, detached, "Group deleted");
        Ok(detached)
    }
}

#[async_trait]
impl BaseRepository<Post, i64> for InMemoryPostRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint(format!(
                "user {} does not exist",
                post.author_id
            )));
        }
        tables.check_group(post.group_id)?;

        tables.last_post_id += 1;
        let post = Post {
            id: tables.last_post_id,
            text: post.text.into_inner(),
            pub_date: Utc::now(),
            author_id: post.author_id,
            group_id: post.group_id,
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        tables.check_group(changes.group_id)?;

        let post = tables.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.text = changes.text.into_inner();
        post.group_id = changes.group_id;
        Ok(post.clone())
    }

    async fn list(&self, filter: PostFilter, page: PageRequest) -> Result<Page<Post>, RepoError> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|post| match filter {
                PostFilter::All => true,
                PostFilter::Group(group_id) => post.group_id == Some(group_id),
                PostFilter::Author(author_id) => post.author_id == author_id,
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));

        Ok(Page::from_ordered(posts, page))
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .values()
            .filter(|post| post.author_id == author_id)
            .count() as u64)
    }
}
