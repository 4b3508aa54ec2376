//! Text posts and their derived read-model fields.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::error::FieldViolation;
use crate::domain::user::UserId;

/// Length of the feed snippet derived from a post body.
pub const SNIPPET_LEN: usize = 47;

/// Stable post identifier (UUID v4).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct PostId(Uuid);

impl PostId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A stored text post. Points and author details are derived on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Stable identifier.
    pub id: PostId,
    /// Post headline.
    pub title: String,
    /// Full post body.
    pub body: String,
    /// Owning user; only the owner may update or delete the post.
    pub author_id: UserId,
    /// Record creation timestamp, also the feed's keyset column.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Feed snippet: the first [`SNIPPET_LEN`] characters of the body with a
    /// trailing ellipsis.
    #[must_use]
    pub fn text_snippet(&self) -> String {
        let mut snippet: String = self.body.chars().take(SNIPPET_LEN).collect();
        snippet.push_str("...");
        snippet
    }
}

/// Validated input for creating a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Post headline, non-empty after trimming.
    pub title: String,
    /// Full post body, non-empty after trimming.
    pub body: String,
}

impl NewPost {
    /// Validate title and body.
    ///
    /// # Errors
    /// Returns field-tagged violations for empty inputs.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, Vec<FieldViolation>> {
        let title = title.into();
        let body = body.into();
        let mut violations = Vec::new();
        if title.trim().is_empty() {
            violations.push(FieldViolation::new("title", "Title must not be empty."));
        }
        if body.trim().is_empty() {
            // Tagged with the wire name of the field, not the column name.
            violations.push(FieldViolation::new("text", "Text must not be empty."));
        }
        if violations.is_empty() {
            Ok(Self { title, body })
        } else {
            Err(violations)
        }
    }
}

/// Partial update applied to an owned post. Absent fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    /// Replacement headline, if any.
    pub title: Option<String>,
    /// Replacement body, if any.
    pub body: Option<String>,
}

impl PostPatch {
    /// Whether the patch changes anything at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }

    /// Validate supplied fields: a patch must not blank out a value that is
    /// required non-empty at creation.
    ///
    /// # Errors
    /// Returns field-tagged violations for present-but-blank inputs.
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut violations = Vec::new();
        if self
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            violations.push(FieldViolation::new("title", "Title must not be empty."));
        }
        if self
            .body
            .as_deref()
            .is_some_and(|body| body.trim().is_empty())
        {
            violations.push(FieldViolation::new("text", "Text must not be empty."));
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
