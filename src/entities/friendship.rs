//! Friendship entity - Directed request edge with a status flag.
//!
//! The edge keeps who asked whom for the pending inbox, while `pair_key`
//! (the two user ids in canonical order) is unique so an unordered pair never
//! has more than one edge.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a friendship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum FriendshipStatus {
    /// Waiting for the recipient
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Mutual friendship
    #[sea_orm(string_value = "accepted")]
    Accepted,
}

/// Friendship database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "friendships")]
pub struct Model {
    /// Unique identifier for the edge
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who sent the request
    pub requester_user_id: String,
    /// User who may accept or reject it
    pub recipient_user_id: String,
    /// Canonical unordered pair, see [`pair_key`]
    #[sea_orm(unique)]
    pub pair_key: String,
    /// Current state
    pub status: FriendshipStatus,
    /// When the request was sent
    pub created_at: DateTimeUtc,
    /// Last status change
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Friendship and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Profile of the user who sent the request
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::RequesterUserId",
        to = "super::profile::Column::UserId"
    )]
    Requester,
    /// Profile of the user the request is addressed to
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::RecipientUserId",
        to = "super::profile::Column::UserId"
    )]
    Recipient,
}

// Joins from an edge to a profile go through the requester, which is what the
// pending inbox needs.
impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requester.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Builds the order-independent key for a pair of users.
#[must_use]
pub fn pair_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}:{b}")
    } else {
        format!("{b}:{a}")
    }
}

impl Model {
    /// Returns the user on the other end of this edge from `user_id`.
    #[must_use]
    pub fn other_user(&self, user_id: &str) -> &str {
        if self.requester_user_id == user_id {
            &self.recipient_user_id
        } else {
            &self.requester_user_id
        }
    }
}
