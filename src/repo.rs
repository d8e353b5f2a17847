use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::entities::{AddedComment, AddedReply, AddedThread, NewComment, NewReply, NewThread, ValidationError};
use crate::ids::{IdGenerator, UuidIdGenerator};
use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("{0} tidak ditemukan di database")]
    NotFound(Resource),
    #[error("anda tidak berhak mengakses {0} tersebut")]
    Forbidden(Resource),
    #[error("stored row failed validation: {0}")]
    Invalid(#[from] ValidationError),
    #[error("store failure: {0}")]
    Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait ThreadRepo: Send + Sync {
    async fn add_thread(&self, new: NewThread) -> RepoResult<AddedThread>;
    /// Fails with `NotFound(Thread)` when no thread has this id.
    async fn check_thread_availability(&self, id: &str) -> RepoResult<()>;
    async fn get_thread_by_id(&self, id: &str) -> RepoResult<ThreadRecord>;
}

#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn add_comment(&self, new: NewComment) -> RepoResult<AddedComment>;
    async fn check_comment_availability(&self, id: &str) -> RepoResult<()>;
    /// Fails with `Forbidden(Comment)` unless `owner` wrote the comment.
    async fn verify_comment_access(&self, id: &str, owner: &str) -> RepoResult<()>;
    /// Soft delete; the stored content is kept. Repeating it is a no-op.
    async fn delete_comment(&self, id: &str) -> RepoResult<()>;
    /// Oldest first.
    async fn get_comments_by_thread_id(&self, thread_id: &str) -> RepoResult<Vec<CommentRecord>>;
}

#[async_trait]
pub trait ReplyRepo: Send + Sync {
    async fn add_reply(&self, new: NewReply) -> RepoResult<AddedReply>;
    async fn check_reply_availability(&self, id: &str) -> RepoResult<()>;
    async fn verify_reply_access(&self, id: &str, owner: &str) -> RepoResult<()>;
    async fn delete_reply(&self, id: &str) -> RepoResult<()>;
    /// Oldest first.
    async fn get_replies_by_comment_id(&self, comment_id: &str) -> RepoResult<Vec<ReplyRecord>>;
}

#[async_trait]
pub trait CommentLikeRepo: Send + Sync {
    async fn is_comment_liked(&self, comment_id: &str, owner: &str) -> RepoResult<bool>;
    /// Adding a like that already exists leaves the single row in place.
    async fn add_comment_like(&self, comment_id: &str, owner: &str) -> RepoResult<()>;
    async fn delete_comment_like(&self, comment_id: &str, owner: &str) -> RepoResult<()>;
    async fn count_comment_likes(&self, comment_id: &str) -> RepoResult<u64>;
}

pub trait Repo: ThreadRepo + CommentRepo + ReplyRepo + CommentLikeRepo {}

impl<T> Repo for T where T: ThreadRepo + CommentRepo + ReplyRepo + CommentLikeRepo {}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use chrono::DateTime;
    use std::collections::HashMap;
    use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

    struct StoredThread {
        id: Id,
        title: String,
        body: String,
        owner: Id,
        created_at: DateTime<Utc>,
    }

    struct StoredPost {
        id: Id,
        parent_id: Id,
        content: String,
        owner: Id,
        is_delete: bool,
        created_at: DateTime<Utc>,
    }

    struct StoredLike {
        id: Id,
        comment_id: Id,
        owner: Id,
        created_at: DateTime<Utc>,
    }

    // Vecs keep insertion order so equal timestamps still sort stably.
    #[derive(Default)]
    struct State {
        users: HashMap<Id, String>,
        threads: Vec<StoredThread>,
        comments: Vec<StoredPost>,
        replies: Vec<StoredPost>,
        likes: Vec<StoredLike>,
    }

    impl State {
        fn username(&self, owner: &str) -> String {
            self.users.get(owner).cloned().unwrap_or_else(|| owner.to_string())
        }
    }

    /// Process-local store. Every instance is isolated, which is what the
    /// tests rely on.
    #[derive(Clone)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        ids: Arc<dyn IdGenerator>,
    }

    impl InMemRepo {
        pub fn new() -> Self {
            Self::with_id_generator(Arc::new(UuidIdGenerator))
        }

        pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
            Self { state: Arc::new(RwLock::new(State::default())), ids }
        }

        /// Records a user's display name, standing in for the identity service.
        pub fn register_user(&self, id: impl Into<Id>, username: impl Into<String>) -> RepoResult<()> {
            self.write()?.users.insert(id.into(), username.into());
            Ok(())
        }

        /// Ids of the likes on a comment, oldest first.
        pub fn comment_like_ids(&self, comment_id: &str) -> RepoResult<Vec<Id>> {
            let s = self.read()?;
            let mut likes: Vec<_> = s.likes.iter().filter(|l| l.comment_id == comment_id).collect();
            likes.sort_by_key(|l| l.created_at);
            Ok(likes.into_iter().map(|l| l.id.clone()).collect())
        }

        fn read(&self) -> RepoResult<RwLockReadGuard<'_, State>> {
            self.state.read().map_err(|_| RepoError::Internal("in-memory state poisoned".into()))
        }

        fn write(&self) -> RepoResult<RwLockWriteGuard<'_, State>> {
            self.state.write().map_err(|_| RepoError::Internal("in-memory state poisoned".into()))
        }

        fn find_post<'a>(posts: &'a [StoredPost], id: &str, kind: Resource) -> RepoResult<&'a StoredPost> {
            posts.iter().find(|p| p.id == id).ok_or(RepoError::NotFound(kind))
        }

        fn verify_owner(posts: &[StoredPost], id: &str, owner: &str, kind: Resource) -> RepoResult<()> {
            let post = Self::find_post(posts, id, kind)?;
            if post.owner != owner {
                return Err(RepoError::Forbidden(kind));
            }
            Ok(())
        }

        fn soft_delete(posts: &mut [StoredPost], id: &str, kind: Resource) -> RepoResult<()> {
            let post = posts.iter_mut().find(|p| p.id == id).ok_or(RepoError::NotFound(kind))?;
            post.is_delete = true;
            Ok(())
        }

        fn children<'a>(posts: &'a [StoredPost], parent_id: &str) -> Vec<&'a StoredPost> {
            let mut v: Vec<_> = posts.iter().filter(|p| p.parent_id == parent_id).collect();
            v.sort_by_key(|p| p.created_at); // ascending, stable
            v
        }
    }

    impl Default for InMemRepo {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ThreadRepo for InMemRepo {
        async fn add_thread(&self, new: NewThread) -> RepoResult<AddedThread> {
            let id = self.ids.prefixed(Resource::Thread.id_prefix());
            let added = AddedThread::new(id.clone(), new.title.clone(), new.owner.clone())?;
            let mut s = self.write()?;
            s.threads.push(StoredThread { id, title: new.title, body: new.body, owner: new.owner, created_at: Utc::now() });
            Ok(added)
        }

        async fn check_thread_availability(&self, id: &str) -> RepoResult<()> {
            let s = self.read()?;
            if s.threads.iter().any(|t| t.id == id) { Ok(()) } else { Err(RepoError::NotFound(Resource::Thread)) }
        }

        async fn get_thread_by_id(&self, id: &str) -> RepoResult<ThreadRecord> {
            let s = self.read()?;
            let t = s.threads.iter().find(|t| t.id == id).ok_or(RepoError::NotFound(Resource::Thread))?;
            Ok(ThreadRecord {
                id: t.id.clone(),
                title: t.title.clone(),
                body: t.body.clone(),
                created_at: t.created_at,
                username: s.username(&t.owner),
            })
        }
    }

    #[async_trait]
    impl CommentRepo for InMemRepo {
        async fn add_comment(&self, new: NewComment) -> RepoResult<AddedComment> {
            let id = self.ids.prefixed(Resource::Comment.id_prefix());
            let added = AddedComment::new(id.clone(), new.content.clone(), new.owner.clone())?;
            let mut s = self.write()?;
            if !s.threads.iter().any(|t| t.id == new.thread_id) {
                return Err(RepoError::NotFound(Resource::Thread)); // FK
            }
            s.comments.push(StoredPost {
                id,
                parent_id: new.thread_id,
                content: new.content,
                owner: new.owner,
                is_delete: new.is_delete,
                created_at: Utc::now(),
            });
            Ok(added)
        }

        async fn check_comment_availability(&self, id: &str) -> RepoResult<()> {
            Self::find_post(&self.read()?.comments, id, Resource::Comment).map(|_| ())
        }

        async fn verify_comment_access(&self, id: &str, owner: &str) -> RepoResult<()> {
            Self::verify_owner(&self.read()?.comments, id, owner, Resource::Comment)
        }

        async fn delete_comment(&self, id: &str) -> RepoResult<()> {
            Self::soft_delete(&mut self.write()?.comments, id, Resource::Comment)
        }

        async fn get_comments_by_thread_id(&self, thread_id: &str) -> RepoResult<Vec<CommentRecord>> {
            let s = self.read()?;
            Ok(Self::children(&s.comments, thread_id)
                .into_iter()
                .map(|c| CommentRecord {
                    id: c.id.clone(),
                    username: s.username(&c.owner),
                    created_at: c.created_at,
                    content: c.content.clone(),
                    is_delete: c.is_delete,
                })
                .collect())
        }
    }

    #[async_trait]
    impl ReplyRepo for InMemRepo {
        async fn add_reply(&self, new: NewReply) -> RepoResult<AddedReply> {
            let id = self.ids.prefixed(Resource::Reply.id_prefix());
            let added = AddedReply::new(id.clone(), new.content.clone(), new.owner.clone())?;
            let mut s = self.write()?;
            if !s.comments.iter().any(|c| c.id == new.comment_id) {
                return Err(RepoError::NotFound(Resource::Comment));
            }
            s.replies.push(StoredPost {
                id,
                parent_id: new.comment_id,
                content: new.content,
                owner: new.owner,
                is_delete: new.is_delete,
                created_at: Utc::now(),
            });
            Ok(added)
        }

        async fn check_reply_availability(&self, id: &str) -> RepoResult<()> {
            Self::find_post(&self.read()?.replies, id, Resource::Reply).map(|_| ())
        }

        async fn verify_reply_access(&self, id: &str, owner: &str) -> RepoResult<()> {
            Self::verify_owner(&self.read()?.replies, id, owner, Resource::Reply)
        }

        async fn delete_reply(&self, id: &str) -> RepoResult<()> {
            Self::soft_delete(&mut self.write()?.replies, id, Resource::Reply)
        }

        async fn get_replies_by_comment_id(&self, comment_id: &str) -> RepoResult<Vec<ReplyRecord>> {
            let s = self.read()?;
            Ok(Self::children(&s.replies, comment_id)
                .into_iter()
                .map(|r| ReplyRecord {
                    id: r.id.clone(),
                    username: s.username(&r.owner),
                    created_at: r.created_at,
                    content: r.content.clone(),
                    is_delete: r.is_delete,
                })
                .collect())
        }
    }

    #[async_trait]
    impl CommentLikeRepo for InMemRepo {
        async fn is_comment_liked(&self, comment_id: &str, owner: &str) -> RepoResult<bool> {
            Ok(self.read()?.likes.iter().any(|l| l.comment_id == comment_id && l.owner == owner))
        }

        async fn add_comment_like(&self, comment_id: &str, owner: &str) -> RepoResult<()> {
            let mut s = self.write()?;
            if !s.comments.iter().any(|c| c.id == comment_id) {
                return Err(RepoError::NotFound(Resource::Comment));
            }
            if !s.likes.iter().any(|l| l.comment_id == comment_id && l.owner == owner) {
                s.likes.push(StoredLike {
                    id: self.ids.prefixed(COMMENT_LIKE_ID_PREFIX),
                    comment_id: comment_id.to_string(),
                    owner: owner.to_string(),
                    created_at: Utc::now(),
                });
            }
            Ok(())
        }

        async fn delete_comment_like(&self, comment_id: &str, owner: &str) -> RepoResult<()> {
            self.write()?.likes.retain(|l| !(l.comment_id == comment_id && l.owner == owner));
            Ok(())
        }

        async fn count_comment_likes(&self, comment_id: &str) -> RepoResult<u64> {
            Ok(self.read()?.likes.iter().filter(|l| l.comment_id == comment_id).count() as u64)
        }
    }
}

// Postgres implementation (feature = "postgres-store")
#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use sqlx::{Pool, Postgres};

    impl From<sqlx::Error> for RepoError {
        fn from(e: sqlx::Error) -> Self {
            tracing::error!(error = %e, "postgres query failed");
            RepoError::Internal(e.to_string())
        }
    }

    #[derive(Clone)]
    pub struct PgRepo {
        pool: Pool<Postgres>,
        ids: Arc<dyn IdGenerator>,
    }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self {
            Self::with_id_generator(pool, Arc::new(UuidIdGenerator))
        }

        pub fn with_id_generator(pool: Pool<Postgres>, ids: Arc<dyn IdGenerator>) -> Self {
            Self { pool, ids }
        }

        pub fn pool(&self) -> &Pool<Postgres> {
            &self.pool
        }

        /// Applies the bundled schema migrations.
        pub async fn migrate(&self) -> RepoResult<()> {
            sqlx::migrate!("./migrations")
                .run(&self.pool)
                .await
                .map_err(|e| RepoError::Internal(format!("migration failed: {e}")))
        }

        async fn exists(&self, sql: &str, id: &str, kind: Resource) -> RepoResult<()> {
            let row: Option<(String,)> = sqlx::query_as(sql).bind(id).fetch_optional(&self.pool).await?;
            row.map(|_| ()).ok_or(RepoError::NotFound(kind))
        }

        async fn verify_owner(&self, sql: &str, id: &str, owner: &str, kind: Resource) -> RepoResult<()> {
            let stored: Option<String> = sqlx::query_scalar(sql).bind(id).fetch_optional(&self.pool).await?;
            match stored {
                None => Err(RepoError::NotFound(kind)),
                Some(o) if o != owner => Err(RepoError::Forbidden(kind)),
                Some(_) => Ok(()),
            }
        }
    }

    #[async_trait]
    impl ThreadRepo for PgRepo {
        async fn add_thread(&self, new: NewThread) -> RepoResult<AddedThread> {
            let id = self.ids.prefixed(Resource::Thread.id_prefix());
            let (id, title, owner): (String, String, String) = sqlx::query_as(
                "INSERT INTO threads (id, title, body, owner, created_at, updated_at) VALUES ($1,$2,$3,$4,$5,$5) RETURNING id, title, owner",
            )
            .bind(&id)
            .bind(&new.title)
            .bind(&new.body)
            .bind(&new.owner)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
            Ok(AddedThread::new(id, title, owner)?)
        }

        async fn check_thread_availability(&self, id: &str) -> RepoResult<()> {
            self.exists("SELECT id FROM threads WHERE id = $1", id, Resource::Thread).await
        }

        async fn get_thread_by_id(&self, id: &str) -> RepoResult<ThreadRecord> {
            sqlx::query_as::<_, ThreadRecord>(
                r#"
                SELECT t.id, t.title, t.body, t.created_at, COALESCE(u.username, t.owner) AS username
                FROM threads t
                LEFT JOIN users u ON u.id = t.owner
                WHERE t.id = $1
            "#,
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound(Resource::Thread))
        }
    }

    #[async_trait]
    impl CommentRepo for PgRepo {
        async fn add_comment(&self, new: NewComment) -> RepoResult<AddedComment> {
            let id = self.ids.prefixed(Resource::Comment.id_prefix());
            let (id, content, owner): (String, String, String) = sqlx::query_as(
                "INSERT INTO comments (id, content, thread_id, owner, is_delete, created_at, updated_at) VALUES ($1,$2,$3,$4,$5,$6,$6) RETURNING id, content, owner",
            )
            .bind(&id)
            .bind(&new.content)
            .bind(&new.thread_id)
            .bind(&new.owner)
            .bind(new.is_delete)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
            Ok(AddedComment::new(id, content, owner)?)
        }

        async fn check_comment_availability(&self, id: &str) -> RepoResult<()> {
            self.exists("SELECT id FROM comments WHERE id = $1", id, Resource::Comment).await
        }

        async fn verify_comment_access(&self, id: &str, owner: &str) -> RepoResult<()> {
            self.verify_owner("SELECT owner FROM comments WHERE id = $1", id, owner, Resource::Comment).await
        }

        async fn delete_comment(&self, id: &str) -> RepoResult<()> {
            // updated_at only moves on the first delete
            let done = sqlx::query(
                "UPDATE comments SET updated_at = CASE WHEN is_delete THEN updated_at ELSE $2 END, is_delete = TRUE WHERE id = $1",
            )
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
            if done.rows_affected() == 0 {
                return Err(RepoError::NotFound(Resource::Comment));
            }
            Ok(())
        }

        async fn get_comments_by_thread_id(&self, thread_id: &str) -> RepoResult<Vec<CommentRecord>> {
            let recs = sqlx::query_as::<_, CommentRecord>(
                r#"
                SELECT c.id, COALESCE(u.username, c.owner) AS username, c.created_at, c.content, c.is_delete
                FROM comments c
                LEFT JOIN users u ON u.id = c.owner
                WHERE c.thread_id = $1
                ORDER BY c.created_at ASC, c.id ASC
            "#,
            )
            .bind(thread_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(recs)
        }
    }

    #[async_trait]
    impl ReplyRepo for PgRepo {
        async fn add_reply(&self, new: NewReply) -> RepoResult<AddedReply> {
            let id = self.ids.prefixed(Resource::Reply.id_prefix());
            let (id, content, owner): (String, String, String) = sqlx::query_as(
                "INSERT INTO replies (id, content, comment_id, owner, is_delete, created_at, updated_at) VALUES ($1,$2,$3,$4,$5,$6,$6) RETURNING id, content, owner",
            )
            .bind(&id)
            .bind(&new.content)
            .bind(&new.comment_id)
            .bind(&new.owner)
            .bind(new.is_delete)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
            Ok(AddedReply::new(id, content, owner)?)
        }

        async fn check_reply_availability(&self, id: &str) -> RepoResult<()> {
            self.exists("SELECT id FROM replies WHERE id = $1", id, Resource::Reply).await
        }

        async fn verify_reply_access(&self, id: &str, owner: &str) -> RepoResult<()> {
            self.verify_owner("SELECT owner FROM replies WHERE id = $1", id, owner, Resource::Reply).await
        }

        async fn delete_reply(&self, id: &str) -> RepoResult<()> {
            // updated_at only moves on the first delete
            let done = sqlx::query(
                "UPDATE replies SET updated_at = CASE WHEN is_delete THEN updated_at ELSE $2 END, is_delete = TRUE WHERE id = $1",
            )
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
            if done.rows_affected() == 0 {
                return Err(RepoError::NotFound(Resource::Reply));
            }
            Ok(())
        }

        async fn get_replies_by_comment_id(&self, comment_id: &str) -> RepoResult<Vec<ReplyRecord>> {
            let recs = sqlx::query_as::<_, ReplyRecord>(
                r#"
                SELECT r.id, COALESCE(u.username, r.owner) AS username, r.created_at, r.content, r.is_delete
                FROM replies r
                LEFT JOIN users u ON u.id = r.owner
                WHERE r.comment_id = $1
                ORDER BY r.created_at ASC, r.id ASC
            "#,
            )
            .bind(comment_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(recs)
        }
    }

    #[async_trait]
    impl CommentLikeRepo for PgRepo {
        async fn is_comment_liked(&self, comment_id: &str, owner: &str) -> RepoResult<bool> {
            let liked: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM comment_likes WHERE comment_id = $1 AND owner = $2)")
                .bind(comment_id)
                .bind(owner)
                .fetch_one(&self.pool)
                .await?;
            Ok(liked)
        }

        async fn add_comment_like(&self, comment_id: &str, owner: &str) -> RepoResult<()> {
            let id = self.ids.prefixed(COMMENT_LIKE_ID_PREFIX);
            // a concurrent toggle may have inserted the pair already
            sqlx::query(
                "INSERT INTO comment_likes (id, owner, comment_id, created_at, updated_at) VALUES ($1,$2,$3,$4,$4) ON CONFLICT (comment_id, owner) DO NOTHING",
            )
            .bind(&id)
            .bind(owner)
            .bind(comment_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn delete_comment_like(&self, comment_id: &str, owner: &str) -> RepoResult<()> {
            sqlx::query("DELETE FROM comment_likes WHERE comment_id = $1 AND owner = $2")
                .bind(comment_id)
                .bind(owner)
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn count_comment_likes(&self, comment_id: &str) -> RepoResult<u64> {
            let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comment_likes WHERE comment_id = $1")
                .bind(comment_id)
                .fetch_one(&self.pool)
                .await?;
            Ok(u64::try_from(n).unwrap_or_default())
        }
    }
}
