//! Payload and view entities for threads, comments and replies.
//!
//! Construction is the only place validation happens: typed constructors
//! reject empty required fields, and the `from_json` variants additionally
//! report fields whose JSON type is wrong. Detail views apply redaction of
//! soft-deleted content when they are built, so every read path shares it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::{format_date, CommentRecord, Id, ReplyRecord, ThreadRecord};

pub const DELETED_COMMENT_CONTENT: &str = "**komentar telah dihapus**";
pub const DELETED_REPLY_CONTENT: &str = "**balasan telah dihapus**";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    MissingField,
    TypeMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    NewThread,
    AddedThread,
    NewComment,
    AddedComment,
    NewReply,
    AddedReply,
    DetailThread,
    DetailComment,
    DetailReply,
}

impl EntityKind {
    /// Noun used in client-facing messages.
    fn noun(self) -> &'static str {
        match self {
            EntityKind::NewThread | EntityKind::AddedThread | EntityKind::DetailThread => "thread",
            EntityKind::NewComment | EntityKind::AddedComment | EntityKind::DetailComment => "comment",
            EntityKind::NewReply | EntityKind::AddedReply | EntityKind::DetailReply => "balasan",
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{entity:?}: {kind:?} on `{field}`")]
pub struct ValidationError {
    pub kind: ValidationKind,
    pub entity: EntityKind,
    pub field: &'static str,
}

impl ValidationError {
    pub fn missing(entity: EntityKind, field: &'static str) -> Self {
        Self { kind: ValidationKind::MissingField, entity, field }
    }

    pub fn type_mismatch(entity: EntityKind, field: &'static str) -> Self {
        Self { kind: ValidationKind::TypeMismatch, entity, field }
    }

    /// Message shown to API clients.
    pub fn client_message(&self) -> String {
        let reason = match self.kind {
            ValidationKind::MissingField => "properti yang dibutuhkan tidak ada",
            ValidationKind::TypeMismatch => "tipe data tidak sesuai",
        };
        format!("tidak dapat menambah {} karena {}", self.entity.noun(), reason)
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// Reads required string fields from a JSON object. Presence of every field
/// is checked before any type, so a payload that is both incomplete and
/// mistyped reports the missing field.
fn required_strings(entity: EntityKind, payload: &Value, fields: &[&'static str]) -> Result<Vec<String>, ValidationError> {
    let get = |name: &str| payload.get(name).filter(|v| !is_blank(v));
    if let Some(missing) = fields.iter().copied().find(|f| get(*f).is_none()) {
        return Err(ValidationError::missing(entity, missing));
    }
    fields
        .iter()
        .copied()
        .map(|f| match get(f) {
            Some(Value::String(s)) => Ok(s.clone()),
            _ => Err(ValidationError::type_mismatch(entity, f)),
        })
        .collect()
}

fn require(entity: EntityKind, pairs: &[(&'static str, &str)]) -> Result<(), ValidationError> {
    match pairs.iter().find(|(_, v)| v.is_empty()) {
        Some((field, _)) => Err(ValidationError::missing(entity, *field)),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------- threads

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewThread {
    pub title: String,
    pub body: String,
    pub owner: Id,
}

impl NewThread {
    pub fn new(title: impl Into<String>, body: impl Into<String>, owner: impl Into<Id>) -> Result<Self, ValidationError> {
        let (title, body, owner) = (title.into(), body.into(), owner.into());
        require(EntityKind::NewThread, &[("title", title.as_str()), ("body", body.as_str()), ("owner", owner.as_str())])?;
        Ok(Self { title, body, owner })
    }

    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let v = required_strings(EntityKind::NewThread, payload, &["title", "body", "owner"])?;
        let [title, body, owner]: [String; 3] = v.try_into().map_err(|_| ValidationError::missing(EntityKind::NewThread, "title"))?;
        Self::new(title, body, owner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddedThread {
    pub id: Id,
    pub title: String,
    pub owner: Id,
}

impl AddedThread {
    pub fn new(id: impl Into<Id>, title: impl Into<String>, owner: impl Into<Id>) -> Result<Self, ValidationError> {
        let (id, title, owner) = (id.into(), title.into(), owner.into());
        require(EntityKind::AddedThread, &[("id", id.as_str()), ("title", title.as_str()), ("owner", owner.as_str())])?;
        Ok(Self { id, title, owner })
    }
}

/// Thread detail view. Holds already redacted comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DetailThread {
    pub id: Id,
    pub title: String,
    pub body: String,
    pub date: String,
    pub username: String,
    pub comments: Vec<DetailComment>,
}

impl DetailThread {
    pub fn new(
        id: impl Into<Id>,
        title: impl Into<String>,
        body: impl Into<String>,
        date: impl Into<String>,
        username: impl Into<String>,
        comments: Vec<DetailComment>,
    ) -> Result<Self, ValidationError> {
        let (id, title, body, date, username) = (id.into(), title.into(), body.into(), date.into(), username.into());
        require(
            EntityKind::DetailThread,
            &[("id", id.as_str()), ("title", title.as_str()), ("body", body.as_str()), ("date", date.as_str()), ("username", username.as_str())],
        )?;
        Ok(Self { id, title, body, date, username, comments })
    }

    pub fn from_record(record: ThreadRecord, comments: Vec<DetailComment>) -> Result<Self, ValidationError> {
        let date = format_date(&record.created_at);
        Self::new(record.id, record.title, record.body, date, record.username, comments)
    }
}

// --------------------------------------------------------------- comments

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub content: String,
    pub thread_id: Id,
    pub owner: Id,
    pub is_delete: bool,
}

impl NewComment {
    pub fn new(content: impl Into<String>, thread_id: impl Into<Id>, owner: impl Into<Id>) -> Result<Self, ValidationError> {
        let (content, thread_id, owner) = (content.into(), thread_id.into(), owner.into());
        require(EntityKind::NewComment, &[("content", content.as_str()), ("threadId", thread_id.as_str()), ("owner", owner.as_str())])?;
        Ok(Self { content, thread_id, owner, is_delete: false })
    }

    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let v = required_strings(EntityKind::NewComment, payload, &["content", "threadId", "owner"])?;
        let [content, thread_id, owner]: [String; 3] =
            v.try_into().map_err(|_| ValidationError::missing(EntityKind::NewComment, "content"))?;
        Self::new(content, thread_id, owner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddedComment {
    pub id: Id,
    pub content: String,
    pub owner: Id,
}

impl AddedComment {
    pub fn new(id: impl Into<Id>, content: impl Into<String>, owner: impl Into<Id>) -> Result<Self, ValidationError> {
        let (id, content, owner) = (id.into(), content.into(), owner.into());
        require(EntityKind::AddedComment, &[("id", id.as_str()), ("content", content.as_str()), ("owner", owner.as_str())])?;
        Ok(Self { id, content, owner })
    }

    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let v = required_strings(EntityKind::AddedComment, payload, &["id", "content", "owner"])?;
        let [id, content, owner]: [String; 3] =
            v.try_into().map_err(|_| ValidationError::missing(EntityKind::AddedComment, "id"))?;
        Self::new(id, content, owner)
    }
}

/// Comment as shown inside a thread detail. Deleted comments carry the
/// redaction marker instead of their stored text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailComment {
    pub id: Id,
    pub username: String,
    pub date: String,
    pub content: String,
    #[serde(skip)]
    pub is_delete: bool,
    pub like_count: u64,
    pub replies: Vec<DetailReply>,
}

impl DetailComment {
    pub fn new(
        id: impl Into<Id>,
        username: impl Into<String>,
        date: impl Into<String>,
        content: impl Into<String>,
        is_delete: bool,
    ) -> Result<Self, ValidationError> {
        let (id, username, date, content) = (id.into(), username.into(), date.into(), content.into());
        require(
            EntityKind::DetailComment,
            &[("id", id.as_str()), ("username", username.as_str()), ("date", date.as_str()), ("content", content.as_str())],
        )?;
        let content = if is_delete { DELETED_COMMENT_CONTENT.to_string() } else { content };
        Ok(Self { id, username, date, content, is_delete, like_count: 0, replies: Vec::new() })
    }

    pub fn with_like_count(mut self, like_count: u64) -> Self {
        self.like_count = like_count;
        self
    }

    pub fn with_replies(mut self, replies: Vec<DetailReply>) -> Self {
        self.replies = replies;
        self
    }
}

impl TryFrom<CommentRecord> for DetailComment {
    type Error = ValidationError;

    fn try_from(r: CommentRecord) -> Result<Self, Self::Error> {
        let date = format_date(&r.created_at);
        Self::new(r.id, r.username, date, r.content, r.is_delete)
    }
}

// ---------------------------------------------------------------- replies

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReply {
    pub content: String,
    pub comment_id: Id,
    pub owner: Id,
    pub is_delete: bool,
}

impl NewReply {
    pub fn new(content: impl Into<String>, comment_id: impl Into<Id>, owner: impl Into<Id>) -> Result<Self, ValidationError> {
        let (content, comment_id, owner) = (content.into(), comment_id.into(), owner.into());
        require(EntityKind::NewReply, &[("content", content.as_str()), ("commentId", comment_id.as_str()), ("owner", owner.as_str())])?;
        Ok(Self { content, comment_id, owner, is_delete: false })
    }

    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let v = required_strings(EntityKind::NewReply, payload, &["content", "commentId", "owner"])?;
        let [content, comment_id, owner]: [String; 3] =
            v.try_into().map_err(|_| ValidationError::missing(EntityKind::NewReply, "content"))?;
        Self::new(content, comment_id, owner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddedReply {
    pub id: Id,
    pub content: String,
    pub owner: Id,
}

impl AddedReply {
    pub fn new(id: impl Into<Id>, content: impl Into<String>, owner: impl Into<Id>) -> Result<Self, ValidationError> {
        let (id, content, owner) = (id.into(), content.into(), owner.into());
        require(EntityKind::AddedReply, &[("id", id.as_str()), ("content", content.as_str()), ("owner", owner.as_str())])?;
        Ok(Self { id, content, owner })
    }

    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let v = required_strings(EntityKind::AddedReply, payload, &["id", "content", "owner"])?;
        let [id, content, owner]: [String; 3] =
            v.try_into().map_err(|_| ValidationError::missing(EntityKind::AddedReply, "id"))?;
        Self::new(id, content, owner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DetailReply {
    pub id: Id,
    pub content: String,
    pub date: String,
    pub username: String,
    #[serde(skip)]
    pub is_delete: bool,
}

impl DetailReply {
    pub fn new(
        id: impl Into<Id>,
        username: impl Into<String>,
        date: impl Into<String>,
        content: impl Into<String>,
        is_delete: bool,
    ) -> Result<Self, ValidationError> {
        let (id, username, date, content) = (id.into(), username.into(), date.into(), content.into());
        require(
            EntityKind::DetailReply,
            &[("id", id.as_str()), ("username", username.as_str()), ("date", date.as_str()), ("content", content.as_str())],
        )?;
        let content = if is_delete { DELETED_REPLY_CONTENT.to_string() } else { content };
        Ok(Self { id, content, date, username, is_delete })
    }
}

impl TryFrom<ReplyRecord> for DetailReply {
    type Error = ValidationError;

    fn try_from(r: ReplyRecord) -> Result<Self, Self::Error> {
        let date = format_date(&r.created_at);
        Self::new(r.id, r.username, date, r.content, r.is_delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_comment_reports_missing_before_type() {
        let err = NewComment::from_json(&json!({"content": 123, "threadId": "thread-1"})).unwrap_err();
        assert_eq!(err, ValidationError::missing(EntityKind::NewComment, "owner"));
        assert_eq!(err.client_message(), "tidak dapat menambah comment karena properti yang dibutuhkan tidak ada");
    }

    #[test]
    fn new_comment_rejects_wrong_types() {
        let err = NewComment::from_json(&json!({"content": 123, "threadId": "thread-1", "owner": "user-1"})).unwrap_err();
        assert_eq!(err.kind, ValidationKind::TypeMismatch);
        assert_eq!(err.field, "content");
        assert_eq!(err.client_message(), "tidak dapat menambah comment karena tipe data tidak sesuai");
    }

    #[test]
    fn new_reply_starts_undeleted() {
        let r = NewReply::from_json(&json!({"content": "Balasan", "commentId": "comment-123", "owner": "user-123"})).unwrap();
        assert_eq!(r.comment_id, "comment-123");
        assert!(!r.is_delete);
    }

    #[test]
    fn new_reply_type_mismatch_on_owner() {
        let err = NewReply::from_json(&json!({"content": "Balasan", "commentId": true, "owner": 12345})).unwrap_err();
        assert_eq!(err.kind, ValidationKind::TypeMismatch);
        assert_eq!(err.client_message(), "tidak dapat menambah balasan karena tipe data tidak sesuai");
    }

    #[test]
    fn added_reply_needs_owner() {
        let err = AddedReply::from_json(&json!({"id": "reply-123", "content": "Komentar"})).unwrap_err();
        assert_eq!(err, ValidationError::missing(EntityKind::AddedReply, "owner"));
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let err = NewThread::new("Judul Thread", "", "user-1").unwrap_err();
        assert_eq!(err, ValidationError::missing(EntityKind::NewThread, "body"));
    }

    #[test]
    fn deleted_comment_is_redacted() {
        let c = DetailComment::new("comment-1", "dicoding", "2021-08-08T07:22:33.555Z", "rahasia", true).unwrap();
        assert_eq!(c.content, DELETED_COMMENT_CONTENT);
        assert_eq!(c.like_count, 0);
        assert!(c.replies.is_empty());
    }

    #[test]
    fn deleted_reply_is_redacted() {
        let r = DetailReply::new("reply-1", "dicoding", "2021-08-08T07:22:33.555Z", "rahasia", true).unwrap();
        assert_eq!(r.content, DELETED_REPLY_CONTENT);
        let r = DetailReply::new("reply-2", "dicoding", "2021-08-08T07:22:33.555Z", "halo", false).unwrap();
        assert_eq!(r.content, "halo");
    }

    #[test]
    fn detail_comment_hides_is_delete() {
        let c = DetailComment::new("comment-1", "dicoding", "2021-08-08T07:22:33.555Z", "Komentar", false)
            .unwrap()
            .with_like_count(2);
        let v = serde_json::to_value(&c).unwrap();
        assert!(v.get("isDelete").is_none());
        assert_eq!(v["likeCount"], 2);
        assert_eq!(v["replies"], json!([]));
    }

    #[test]
    fn detail_comment_requires_username() {
        let err = DetailComment::new("comment-1", "", "2021-08-08T07:22:33.555Z", "Komentar", false).unwrap_err();
        assert_eq!(err, ValidationError::missing(EntityKind::DetailComment, "username"));
    }
}
