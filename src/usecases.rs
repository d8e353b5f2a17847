//! Forum operations as seen by the HTTP layer.
//!
//! Every operation checks availability parent first (thread, then comment,
//! then reply) and stops at the first gate that fails. Ownership is only
//! verified on the delete paths.

use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::{debug, info};

use crate::entities::{
    AddedComment, AddedReply, AddedThread, DetailComment, DetailReply, DetailThread, NewComment, NewReply, NewThread,
    ValidationError,
};
use crate::error::ForumError;
use crate::models::CommentRecord;
use crate::repo::Repo;

fn invalid_row(e: ValidationError) -> ForumError {
    ForumError::Internal(format!("stored row failed validation: {e}"))
}

#[derive(Clone)]
pub struct ForumService {
    repo: Arc<dyn Repo>,
}

impl ForumService {
    pub fn new(repo: Arc<dyn Repo>) -> Self {
        Self { repo }
    }

    pub async fn add_thread(&self, new: NewThread) -> Result<AddedThread, ForumError> {
        let added = self.repo.add_thread(new).await?;
        info!(thread_id = %added.id, owner = %added.owner, "thread added");
        Ok(added)
    }

    /// Builds the full thread view: comments oldest first, each with its
    /// like count and its replies oldest first, deleted content redacted.
    pub async fn get_detail_thread(&self, thread_id: &str) -> Result<DetailThread, ForumError> {
        self.repo.check_thread_availability(thread_id).await?;

        let thread = self.repo.get_thread_by_id(thread_id).await?;
        let comments = self.repo.get_comments_by_thread_id(thread_id).await?;
        debug!(thread_id, comments = comments.len(), "assembling thread detail");

        // try_join_all yields results in input order, not completion order
        let comments = try_join_all(comments.into_iter().map(|c| self.detail_comment(c))).await?;

        DetailThread::from_record(thread, comments).map_err(invalid_row)
    }

    async fn detail_comment(&self, record: CommentRecord) -> Result<DetailComment, ForumError> {
        let (like_count, replies) = futures_util::try_join!(
            self.repo.count_comment_likes(&record.id),
            self.repo.get_replies_by_comment_id(&record.id),
        )?;

        let replies = replies
            .into_iter()
            .map(DetailReply::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid_row)?;

        Ok(DetailComment::try_from(record)
            .map_err(invalid_row)?
            .with_like_count(like_count)
            .with_replies(replies))
    }

    pub async fn add_comment(&self, new: NewComment) -> Result<AddedComment, ForumError> {
        self.repo.check_thread_availability(&new.thread_id).await?;

        let thread_id = new.thread_id.clone();
        let added = self.repo.add_comment(new).await?;
        info!(%thread_id, comment_id = %added.id, owner = %added.owner, "comment added");
        Ok(added)
    }

    pub async fn delete_comment(&self, thread_id: &str, comment_id: &str, owner: &str) -> Result<(), ForumError> {
        self.repo.check_thread_availability(thread_id).await?;
        self.repo.check_comment_availability(comment_id).await?;
        self.repo.verify_comment_access(comment_id, owner).await?;

        self.repo.delete_comment(comment_id).await?;
        info!(thread_id, comment_id, owner, "comment soft-deleted");
        Ok(())
    }

    pub async fn add_reply(&self, thread_id: &str, new: NewReply) -> Result<AddedReply, ForumError> {
        self.repo.check_thread_availability(thread_id).await?;
        self.repo.check_comment_availability(&new.comment_id).await?;

        let comment_id = new.comment_id.clone();
        let added = self.repo.add_reply(new).await?;
        info!(thread_id, %comment_id, reply_id = %added.id, owner = %added.owner, "reply added");
        Ok(added)
    }

    pub async fn delete_reply(&self, thread_id: &str, comment_id: &str, reply_id: &str, owner: &str) -> Result<(), ForumError> {
        self.repo.check_thread_availability(thread_id).await?;
        self.repo.check_comment_availability(comment_id).await?;
        self.repo.check_reply_availability(reply_id).await?;
        self.repo.verify_reply_access(reply_id, owner).await?;

        self.repo.delete_reply(reply_id).await?;
        info!(thread_id, comment_id, reply_id, owner, "reply soft-deleted");
        Ok(())
    }

    /// Likes the comment if `owner` has not liked it yet, otherwise removes
    /// the like. Check and write are separate store calls; the store itself
    /// keeps at most one like per (comment, owner).
    pub async fn toggle_comment_like(&self, thread_id: &str, comment_id: &str, owner: &str) -> Result<(), ForumError> {
        self.repo.check_thread_availability(thread_id).await?;
        self.repo.check_comment_availability(comment_id).await?;

        if self.repo.is_comment_liked(comment_id, owner).await? {
            self.repo.delete_comment_like(comment_id, owner).await?;
            info!(thread_id, comment_id, owner, "comment unliked");
        } else {
            self.repo.add_comment_like(comment_id, owner).await?;
            info!(thread_id, comment_id, owner, "comment liked");
        }
        Ok(())
    }
}
