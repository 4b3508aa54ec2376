//! Votes: the one-per-(user, post) join entity and its direction.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::post::PostId;
use crate::domain::user::UserId;

/// Stable vote identifier (UUID v4).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct VoteId(Uuid);

impl VoteId {
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

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Direction of a vote. Re-voting overwrites the direction in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    /// Counts +1 towards the post's points.
    Up,
    /// Counts -1 towards the post's points.
    Down,
}

impl VoteDirection {
    /// Contribution of this direction to a post's point total.
    #[must_use]
    pub const fn value(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// One user's vote on one post.
///
/// Invariant: at most one vote exists per `(user_id, post_id)` pair,
/// enforced by the database's unique constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Stable identifier.
    pub id: VoteId,
    /// The post voted on. Deleting the post cascades to its votes.
    pub post_id: PostId,
    /// The voting user.
    pub user_id: UserId,
    /// Current direction; mutated rather than duplicated on re-vote.
    pub direction: VoteDirection,
}

/// Result of casting or retracting a vote: the affected vote's identifier
/// and the post's recomputed point total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    /// Identifier of the created, updated, or removed vote.
    #[schema(value_type = String)]
    pub vote_id: VoteId,
    /// Point total of the post after the mutation.
    pub points: i64,
}

/// Sum the +1/-1 contributions of a set of directions.
#[must_use]
pub fn tally(directions: impl IntoIterator<Item = VoteDirection>) -> i64 {
    directions.into_iter().map(VoteDirection::value).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(vec![], 0)]
    #[case(vec![VoteDirection::Up], 1)]
    #[case(vec![VoteDirection::Down], -1)]
    #[case(vec![VoteDirection::Up, VoteDirection::Up, VoteDirection::Down], 1)]
    fn tally_sums_directional_values(#[case] directions: Vec<VoteDirection>, #[case] expected: i64) {
        assert_eq!(tally(directions), expected);
    }

    #[rstest]
    fn direction_serialises_snake_case() {
        assert_eq!(
            serde_json::to_value(VoteDirection::Up).expect("serialise"),
            serde_json::json!("up")
        );
        assert_eq!(
            serde_json::from_value::<VoteDirection>(serde_json::json!("down")).expect("parse"),
            VoteDirection::Down
        );
    }
}
