//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use postboard_core::domain::{Group, NewGroup, NewPost, Post, PostChanges, User};
use postboard_core::error::RepoError;
use postboard_core::pagination::{Page, PageRequest};
use postboard_core::ports::{GroupRepository, PostFilter, PostRepository, UserRepository};

use super::entity::group::{self, Entity as GroupEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL group repository.
pub type PostgresGroupRepository = PostgresBaseRepository<GroupEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let model = user::ActiveModel::from(user)
            .insert(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(model.into())
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let result = GroupEntity::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
        let result = GroupEntity::find()
            .order_by_asc(group::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn create(&self, group: NewGroup) -> Result<Group, RepoError> {
        let model = group::ActiveModel {
            title: Set(group.title),
            slug: Set(group.slug),
            description: Set(group.description),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn delete(&self, id: i64) -> Result<u64, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let detached = PostEntity::update_many()
            .col_expr(post::Column::GroupId, Expr::value(Option::<i64>::None))
            .filter(post::Column::GroupId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?
            .rows_affected;

        let deleted = GroupEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        if deleted.rows_affected == 0 {
            // Dropping the transaction rolls the detach back.
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(map_db_err)?;

        tracing::info!(group_id = id, detached, "Group deleted");
        Ok(detached)
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        let model = post::ActiveModel {
            text: Set(post.text.into_inner()),
            pub_date: Set(Utc::now().into()),
            author_id: Set(post.author_id),
            group_id: Set(post.group_id),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, RepoError> {
        // Only the fields set here are written; author and pub_date stay as stored.
        let model = post::ActiveModel {
            id: Unchanged(id),
            text: Set(changes.text.into_inner()),
            group_id: Set(changes.group_id),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn list(&self, filter: PostFilter, page: PageRequest) -> Result<Page<Post>, RepoError> {
        let query = match filter {
            PostFilter::All => PostEntity::find(),
            PostFilter::Group(group_id) => {
                PostEntity::find().filter(post::Column::GroupId.eq(group_id))
            }
            PostFilter::Author(author_id) => {
                PostEntity::find().filter(post::Column::AuthorId.eq(author_id))
            }
        };

        let paginator = query
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::Id)
            .paginate(&self.db, page.size());

        let total_count = paginator.num_items().await.map_err(map_db_err)?;
        if page.offset() >= total_count {
            return Ok(Page::new(Vec::new(), page, total_count));
        }

        let models = paginator
            .fetch_page(page.number() - 1)
            .await
            .map_err(map_db_err)?;

        Ok(Page::new(
            models.into_iter().map(Into::into).collect(),
            page,
            total_count,
        ))
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }
}
