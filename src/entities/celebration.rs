//! Celebration entity - Idempotency record for the weekly winner celebration.
//!
//! A row (`user_id`, `week_end`) means the celebration for the week ending on
//! `week_end` has already fired for that user.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Celebration database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "celebrations")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User the celebration was shown to
    pub user_id: String,
    /// Saturday closing the celebrated week
    pub week_end: Date,
    /// When it fired
    pub created_at: DateTimeUtc,
}

/// Celebration has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
