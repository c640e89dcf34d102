//! Entry ledger business logic - Daily entries and the points aggregate.
//!
//! Each user has at most one entry per calendar date. Logging a choice is a
//! replace-on-conflict upsert keyed by (`user_id`, `entry_date`), and the
//! profile's `total_points` is recomputed from the ledger inside the same
//! database transaction. Because the total is always a fresh `SUM` rather than
//! an increment, retrying an upsert can never double count.

use crate::{
    core::profile,
    entities::{Choice, DailyEntry, Profile, ProfileColumn, daily_entry},
    errors::{Error, Result},
};
use chrono::{Days, NaiveDate, Utc};
use sea_orm::{
    QueryOrder, QuerySelect, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// How many days past "today" an entry may be dated, to absorb timezone skew.
pub const LOOKAHEAD_DAYS: u64 = 1;

/// Latest date an entry may be logged for, given the caller's `today`.
#[must_use]
pub fn latest_loggable_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_days(Days::new(LOOKAHEAD_DAYS))
        .unwrap_or(today)
}

/// Checks a prospective entry without touching the database.
///
/// # Errors
/// * [`Error::ReadOnlyChoice`] for the legacy penalty choice
/// * [`Error::InvalidEntryDate`] when `entry_date` is after tomorrow
pub fn validate_entry(entry_date: NaiveDate, choice: Choice, today: NaiveDate) -> Result<()> {
    if !choice.is_loggable() {
        return Err(Error::ReadOnlyChoice {
            choice: choice.to_string(),
        });
    }

    let latest = latest_loggable_date(today);
    if entry_date > latest {
        return Err(Error::InvalidEntryDate {
            date: entry_date,
            latest,
        });
    }

    Ok(())
}

/// Logs `choice` for `entry_date`, replacing any earlier choice for that day.
///
/// The ledger write and the aggregate recompute commit together. Calling this
/// again with the same arguments leaves both unchanged.
///
/// # Arguments
/// * `user_id` - Owner of the entry; must already have a profile
/// * `entry_date` - Calendar date being logged
/// * `choice` - `Healthy` or `Junk`
/// * `today` - The caller's local date, used for the look-ahead check
pub async fn upsert_entry(
    db: &DatabaseConnection,
    user_id: &str,
    entry_date: NaiveDate,
    choice: Choice,
    today: NaiveDate,
) -> Result<daily_entry::Model> {
    validate_entry(entry_date, choice, today)?;

    let txn = db.begin().await?;

    profile::require_profile(&txn, user_id).await?;

    let now = Utc::now();
    let entry = daily_entry::ActiveModel {
        user_id: Set(user_id.to_string()),
        entry_date: Set(entry_date),
        choice: Set(choice),
        points: Set(choice.points()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    DailyEntry::insert(entry)
        .on_conflict(
            OnConflict::columns([daily_entry::Column::UserId, daily_entry::Column::EntryDate])
                .update_columns([
                    daily_entry::Column::Choice,
                    daily_entry::Column::Points,
                    daily_entry::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

    let total = recompute_total_points(&txn, user_id).await?;

    let saved = find_entry(&txn, user_id, entry_date)
        .await?
        .ok_or_else(|| {
            Error::Database(DbErr::RecordNotFound(format!(
                "entry for {user_id} on {entry_date}"
            )))
        })?;

    txn.commit().await?;

    info!(
        "Logged {choice} for {user_id} on {entry_date} ({:+} points, total {total})",
        saved.points
    );
    Ok(saved)
}

async fn find_entry<C>(
    db: &C,
    user_id: &str,
    entry_date: NaiveDate,
) -> Result<Option<daily_entry::Model>>
where
    C: ConnectionTrait,
{
    DailyEntry::find()
        .filter(daily_entry::Column::UserId.eq(user_id))
        .filter(daily_entry::Column::EntryDate.eq(entry_date))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Recomputes `total_points` for one user from their ledger rows.
///
/// Pass the transaction handle of the ledger write so both commit atomically.
///
/// # Returns
/// The new total
pub async fn recompute_total_points<C>(db: &C, user_id: &str) -> Result<i64>
where
    C: ConnectionTrait,
{
    let total: i64 = DailyEntry::find()
        .select_only()
        .column_as(daily_entry::Column::Points.sum(), "total")
        .filter(daily_entry::Column::UserId.eq(user_id))
        .into_tuple::<Option<i64>>()
        .one(db)
        .await?
        .flatten()
        .unwrap_or(0);

    Profile::update_many()
        .col_expr(ProfileColumn::TotalPoints, Expr::value(total))
        .filter(ProfileColumn::UserId.eq(user_id))
        .exec(db)
        .await?;

    debug!("Recomputed total_points for {user_id}: {total}");
    Ok(total)
}

/// Outcome of a full aggregate reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Profiles examined
    pub profiles_checked: usize,
    /// Profiles whose cached total disagreed with the ledger
    pub profiles_corrected: usize,
}

/// Recomputes every profile's total from the ledger in one transaction.
///
/// Used at start-up to heal totals written outside the ledger path.
pub async fn reconcile_all_totals(db: &DatabaseConnection) -> Result<ReconcileReport> {
    let txn = db.begin().await?;

    let sums: HashMap<String, i64> = DailyEntry::find()
        .select_only()
        .column(daily_entry::Column::UserId)
        .column_as(daily_entry::Column::Points.sum(), "total")
        .group_by(daily_entry::Column::UserId)
        .into_tuple::<(String, Option<i64>)>()
        .all(&txn)
        .await?
        .into_iter()
        .map(|(user_id, total)| (user_id, total.unwrap_or(0)))
        .collect();

    let profiles = Profile::find().all(&txn).await?;
    let mut report = ReconcileReport {
        profiles_checked: profiles.len(),
        profiles_corrected: 0,
    };

    for p in profiles {
        let expected = sums.get(&p.user_id).copied().unwrap_or(0);
        if p.total_points != expected {
            warn!(
                "total_points drift for {}: cached {}, ledger {expected}",
                p.user_id, p.total_points
            );
            let mut active: crate::entities::profile::ActiveModel = p.into();
            active.total_points = Set(expected);
            active.update(&txn).await?;
            report.profiles_corrected += 1;
        }
    }

    txn.commit().await?;

    info!(
        "Reconciled {} profiles, corrected {}",
        report.profiles_checked, report.profiles_corrected
    );
    Ok(report)
}

/// All entries for a user, newest date first.
pub async fn entries_for_user<C>(db: &C, user_id: &str) -> Result<Vec<daily_entry::Model>>
where
    C: ConnectionTrait,
{
    DailyEntry::find()
        .filter(daily_entry::Column::UserId.eq(user_id))
        .order_by_desc(daily_entry::Column::EntryDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The entry for one date, if logged.
pub async fn entry_for_date<C>(
    db: &C,
    user_id: &str,
    entry_date: NaiveDate,
) -> Result<Option<daily_entry::Model>>
where
    C: ConnectionTrait,
{
    find_entry(db, user_id, entry_date).await
}

/// Entries for a user between `start` and `end` inclusive, oldest first.
pub async fn entries_in_range<C>(
    db: &C,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<daily_entry::Model>>
where
    C: ConnectionTrait,
{
    DailyEntry::find()
        .filter(daily_entry::Column::UserId.eq(user_id))
        .filter(daily_entry::Column::EntryDate.between(start, end))
        .order_by_asc(daily_entry::Column::EntryDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counts consecutive healthy days ending today.
///
/// When today has no entry yet the streak is counted from yesterday, so an
/// unlogged morning does not break it.
#[must_use]
pub fn healthy_streak(entries: &[daily_entry::Model], today: NaiveDate) -> u32 {
    let by_date: HashMap<NaiveDate, Choice> =
        entries.iter().map(|e| (e.entry_date, e.choice)).collect();

    let mut day = if by_date.contains_key(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(d) => d,
            None => return 0,
        }
    };

    let mut streak = 0;
    while by_date.get(&day) == Some(&Choice::Healthy) {
        streak += 1;
        match day.pred_opt() {
            Some(d) => day = d,
            None => break,
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_upsert_entry_validation() -> Result<()> {
        // Validation fails before any query is issued
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let today = date(2024, 1, 10);

        let result = upsert_entry(&db, "u1", date(2024, 1, 12), Choice::Healthy, today).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidEntryDate { latest, .. } if latest == date(2024, 1, 11)
        ));

        let result = upsert_entry(&db, "u1", today, Choice::Penalty, today).await;
        assert!(matches!(result.unwrap_err(), Error::ReadOnlyChoice { .. }));

        Ok(())
    }

    #[test]
    fn test_validate_entry_accepts_today_tomorrow_and_past() {
        let today = date(2024, 1, 10);
        assert!(validate_entry(today, Choice::Healthy, today).is_ok());
        assert!(validate_entry(date(2024, 1, 11), Choice::Junk, today).is_ok());
        assert!(validate_entry(date(2023, 12, 1), Choice::Junk, today).is_ok());
    }

    #[tokio::test]
    async fn test_upsert_entry_requires_profile() -> Result<()> {
        let db = setup_test_db().await?;
        let today = date(2024, 1, 10);

        let result = upsert_entry(&db, "ghost", today, Choice::Healthy, today).await;
        assert!(matches!(result, Err(Error::ProfileNotFound { .. })));
        assert_eq!(DailyEntry::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_entry_is_idempotent() -> Result<()> {
        let (db, profile) = setup_with_profile().await?;
        let today = date(2024, 1, 10);

        upsert_entry(&db, &profile.user_id, today, Choice::Healthy, today).await?;
        upsert_entry(&db, &profile.user_id, today, Choice::Healthy, today).await?;

        let entries = entries_for_user(&db, &profile.user_id).await?;
        assert_eq!(entries.len(), 1);
        assert_eq!(total_points_of(&db, &profile.user_id).await?, 10);

        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_overwrites_choice_for_same_day() -> Result<()> {
        let (db, profile) = setup_with_profile().await?;
        let day = date(2024, 1, 1);
        let today = date(2024, 1, 1);

        let healthy = upsert_entry(&db, &profile.user_id, day, Choice::Healthy, today).await?;
        assert_eq!(total_points_of(&db, &profile.user_id).await?, 10);

        let junk = upsert_entry(&db, &profile.user_id, day, Choice::Junk, today).await?;
        assert_eq!(junk.id, healthy.id);
        assert_eq!(junk.choice, Choice::Junk);
        assert_eq!(junk.points, -10);

        // Dropped by 20 relative to the healthy state, not double counted
        assert_eq!(total_points_of(&db, &profile.user_id).await?, -10);
        assert_eq!(entries_for_user(&db, &profile.user_id).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_entry_leaves_ledger_unchanged() -> Result<()> {
        let (db, profile) = setup_with_profile().await?;
        let today = date(2024, 1, 10);

        upsert_entry(&db, &profile.user_id, today, Choice::Healthy, today).await?;
        let result =
            upsert_entry(&db, &profile.user_id, date(2024, 1, 20), Choice::Healthy, today).await;
        assert!(result.is_err());

        assert_eq!(entries_for_user(&db, &profile.user_id).await?.len(), 1);
        assert_eq!(total_points_of(&db, &profile.user_id).await?, 10);

        Ok(())
    }

    #[tokio::test]
    async fn test_total_matches_ledger_after_each_mutation() -> Result<()> {
        let (db, profile) = setup_with_profile().await?;
        let today = date(2024, 1, 10);
        let steps = [
            (date(2024, 1, 1), Choice::Healthy),
            (date(2024, 1, 2), Choice::Junk),
            (date(2024, 1, 3), Choice::Healthy),
            (date(2024, 1, 2), Choice::Healthy),
            (date(2024, 1, 11), Choice::Junk),
        ];

        for (day, choice) in steps {
            upsert_entry(&db, &profile.user_id, day, choice, today).await?;
            let sum: i64 = entries_for_user(&db, &profile.user_id)
                .await?
                .iter()
                .map(|e| i64::from(e.points))
                .sum();
            assert_eq!(total_points_of(&db, &profile.user_id).await?, sum);
        }
        assert_eq!(total_points_of(&db, &profile.user_id).await?, 20);

        Ok(())
    }

    #[tokio::test]
    async fn test_entries_are_scoped_per_user() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_profile(&db, "u1", "alice").await?;
        create_test_profile(&db, "u2", "bob").await?;
        let today = date(2024, 1, 10);

        upsert_entry(&db, "u1", today, Choice::Healthy, today).await?;
        upsert_entry(&db, "u2", today, Choice::Junk, today).await?;

        assert_eq!(total_points_of(&db, "u1").await?, 10);
        assert_eq!(total_points_of(&db, "u2").await?, -10);
        assert_eq!(
            entry_for_date(&db, "u2", today).await?.unwrap().choice,
            Choice::Junk
        );
        assert!(entry_for_date(&db, "u2", date(2024, 1, 9)).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_entries_in_range_is_inclusive() -> Result<()> {
        let (db, profile) = setup_with_profile().await?;
        let today = date(2024, 1, 31);
        for day in 1..=5 {
            upsert_entry(&db, &profile.user_id, date(2024, 1, day), Choice::Healthy, today)
                .await?;
        }

        let range = entries_in_range(&db, &profile.user_id, date(2024, 1, 2), date(2024, 1, 4))
            .await?;
        let days: Vec<NaiveDate> = range.iter().map(|e| e.entry_date).collect();
        assert_eq!(days, vec![date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4)]);

        Ok(())
    }

    #[tokio::test]
    async fn test_reconcile_all_totals_fixes_drift() -> Result<()> {
        let (db, profile) = setup_with_profile().await?;
        let today = date(2024, 1, 10);
        upsert_entry(&db, &profile.user_id, today, Choice::Healthy, today).await?;

        // Corrupt the cached total behind the ledger's back
        let stored = profile::require_profile(&db, &profile.user_id).await?;
        let mut active: crate::entities::profile::ActiveModel = stored.into();
        active.total_points = Set(999);
        active.update(&db).await?;

        let report = reconcile_all_totals(&db).await?;
        assert_eq!(report.profiles_checked, 1);
        assert_eq!(report.profiles_corrected, 1);
        assert_eq!(total_points_of(&db, &profile.user_id).await?, 10);

        let again = reconcile_all_totals(&db).await?;
        assert_eq!(again.profiles_corrected, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_legacy_penalty_rows_count_toward_total() -> Result<()> {
        let (db, profile) = setup_with_profile().await?;
        insert_legacy_penalty(&db, &profile.user_id, date(2024, 1, 3)).await?;

        let total = recompute_total_points(&db, &profile.user_id).await?;
        assert_eq!(total, -20);

        let entries = entries_for_user(&db, &profile.user_id).await?;
        assert_eq!(entries[0].choice, Choice::Penalty);

        Ok(())
    }

    fn entry(day: NaiveDate, choice: Choice) -> daily_entry::Model {
        daily_entry::Model {
            id: 0,
            user_id: "u1".to_string(),
            entry_date: day,
            choice,
            points: choice.points(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_healthy_streak() {
        let today = date(2024, 1, 10);
        let entries = vec![
            entry(date(2024, 1, 10), Choice::Healthy),
            entry(date(2024, 1, 9), Choice::Healthy),
            entry(date(2024, 1, 8), Choice::Junk),
            entry(date(2024, 1, 7), Choice::Healthy),
        ];
        assert_eq!(healthy_streak(&entries, today), 2);
    }

    #[test]
    fn test_healthy_streak_counts_from_yesterday_when_today_unlogged() {
        let today = date(2024, 1, 10);
        let entries = vec![
            entry(date(2024, 1, 9), Choice::Healthy),
            entry(date(2024, 1, 8), Choice::Healthy),
        ];
        assert_eq!(healthy_streak(&entries, today), 2);
    }

    #[test]
    fn test_healthy_streak_broken_by_junk_today_or_gap() {
        let today = date(2024, 1, 10);
        let junk_today = vec![
            entry(date(2024, 1, 10), Choice::Junk),
            entry(date(2024, 1, 9), Choice::Healthy),
        ];
        assert_eq!(healthy_streak(&junk_today, today), 0);

        let gap = vec![entry(date(2024, 1, 7), Choice::Healthy)];
        assert_eq!(healthy_streak(&gap, today), 0);
    }
}
