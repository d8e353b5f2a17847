use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub type Id = String;

/// Kind of content a gate or access check refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Thread,
    Comment,
    Reply,
}

impl Resource {
    /// Prefix applied to generated ids of this kind.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Resource::Thread => "thread",
            Resource::Comment => "comment",
            Resource::Reply => "reply",
        }
    }
}

// user-facing noun, matches the API's message wording
impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = match self {
            Resource::Thread => "thread",
            Resource::Comment => "komentar",
            Resource::Reply => "balasan",
        };
        f.write_str(noun)
    }
}

pub const COMMENT_LIKE_ID_PREFIX: &str = "comment_like";

/// Thread core fields plus the owner's display name.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ThreadRecord {
    pub id: Id,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub username: String,
}

/// A stored comment as read back for the detail view. `content` is the
/// original text even when `is_delete` is set.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentRecord {
    pub id: Id,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub is_delete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReplyRecord {
    pub id: Id,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub is_delete: bool,
}

/// Renders a stored timestamp the way detail views expose it.
pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
