//! Daily entry entity - The points ledger.
//!
//! At most one row exists per (`user_id`, `entry_date`); the unique index is
//! created in [`crate::config::database::create_tables`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The food choice recorded for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Choice {
    /// A healthy day, worth +10
    #[sea_orm(string_value = "healthy")]
    Healthy,
    /// A junk day, worth -10
    #[sea_orm(string_value = "junk")]
    Junk,
    /// Historical auto-generated penalty, worth -20. Read-only.
    #[sea_orm(string_value = "penalty")]
    Penalty,
}

impl Choice {
    /// Point delta recorded for this choice.
    #[must_use]
    pub const fn points(self) -> i32 {
        match self {
            Self::Healthy => 10,
            Self::Junk => -10,
            Self::Penalty => -20,
        }
    }

    /// Whether users may log this choice. `Penalty` rows are display-only.
    #[must_use]
    pub const fn is_loggable(self) -> bool {
        !matches!(self, Self::Penalty)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Healthy => "healthy",
            Self::Junk => "junk",
            Self::Penalty => "penalty",
        };
        f.write_str(name)
    }
}

/// Daily entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the entry
    pub user_id: String,
    /// Calendar date the entry is for
    pub entry_date: Date,
    /// Recorded choice
    pub choice: Choice,
    /// Point delta derived from `choice`
    pub points: i32,
    /// First time this date was logged
    pub created_at: DateTimeUtc,
    /// Last time the choice was changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `DailyEntry` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one profile
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::UserId"
    )]
    Profile,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_points() {
        assert_eq!(Choice::Healthy.points(), 10);
        assert_eq!(Choice::Junk.points(), -10);
        assert_eq!(Choice::Penalty.points(), -20);
    }

    #[test]
    fn test_penalty_is_not_loggable() {
        assert!(Choice::Healthy.is_loggable());
        assert!(Choice::Junk.is_loggable());
        assert!(!Choice::Penalty.is_loggable());
    }
}
