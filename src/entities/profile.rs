//! Profile entity - One row per authenticated user.
//!
//! Holds the public `username`, the optional contact `email` and the cached
//! `total_points` aggregate. `total_points` is only ever written by the ledger
//! path in [`crate::core::ledger`], never directly by a command.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    /// Surrogate key, also used as the insertion-order tiebreaker
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque identifier issued by the auth collaborator (Discord user id)
    #[sea_orm(unique)]
    pub user_id: String,
    /// Sanitized public handle, `None` until chosen
    #[sea_orm(unique)]
    pub username: Option<String>,
    /// Contact address, never exposed through search
    pub email: Option<String>,
    /// Sum of `points` over this user's daily entries
    pub total_points: i64,
    /// When the profile was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Profile and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One profile has many daily entries
    #[sea_orm(has_many = "super::daily_entry::Entity")]
    DailyEntries,
}

impl Related<super::daily_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DailyEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
