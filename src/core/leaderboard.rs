//! Weekly leaderboard business logic.
//!
//! Weeks run Sunday to Saturday. The leaderboard only ever looks at the most
//! recently closed week, sums each friend's points inside it and reports every
//! friend tied for the top score. The winner celebration is claimed through an
//! idempotency record keyed by the week's closing Saturday, so it fires once
//! per user and week no matter how often the leaderboard is viewed.

use crate::{
    core::friendship,
    entities::{Celebration, DailyEntry, Profile, ProfileColumn, celebration, daily_entry},
    errors::Result,
};
use chrono::{Datelike, Days, NaiveDate, Utc};
use sea_orm::{QuerySelect, Set, prelude::*, sea_query::OnConflict};
use std::collections::HashMap;
use tracing::{debug, info};

/// An inclusive range of calendar dates from a Sunday to the following Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekWindow {
    /// First day (Sunday)
    pub start: NaiveDate,
    /// Last day (Saturday)
    pub end: NaiveDate,
}

impl WeekWindow {
    /// Whether `date` falls inside the window, bounds included.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// One friend's score for a week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyScore {
    /// Friend's user id
    pub user_id: String,
    /// Friend's username, if chosen
    pub username: Option<String>,
    /// Sum of points inside the window
    pub week_points: i64,
}

/// The most recently completed Sunday–Saturday week as of `today`.
///
/// On a Saturday the week ending today counts as closed.
#[must_use]
pub fn last_closed_week(today: NaiveDate) -> WeekWindow {
    // Sun -> 1, Mon -> 2, ..., Fri -> 6, Sat -> 0
    let back_to_saturday = (today.weekday().num_days_from_sunday() + 1) % 7;
    let end = today
        .checked_sub_days(Days::new(u64::from(back_to_saturday)))
        .unwrap_or(NaiveDate::MIN);
    let start = end.checked_sub_days(Days::new(6)).unwrap_or(NaiveDate::MIN);
    WeekWindow { start, end }
}

/// Per-friend point sums for the window, highest first.
///
/// Covers the user's effective friend set; friends with no entries in the
/// window are left out.
pub async fn weekly_scores<C>(db: &C, user_id: &str, window: WeekWindow) -> Result<Vec<WeeklyScore>>
where
    C: ConnectionTrait,
{
    let friend_ids = friendship::effective_friend_ids(db, user_id).await?;

    let sums: Vec<(String, Option<i64>)> = DailyEntry::find()
        .select_only()
        .column(daily_entry::Column::UserId)
        .column_as(daily_entry::Column::Points.sum(), "week_points")
        .filter(daily_entry::Column::UserId.is_in(friend_ids))
        .filter(daily_entry::Column::EntryDate.between(window.start, window.end))
        .group_by(daily_entry::Column::UserId)
        .into_tuple()
        .all(db)
        .await?;

    if sums.is_empty() {
        return Ok(Vec::new());
    }

    let scored_ids: Vec<&str> = sums.iter().map(|(id, _)| id.as_str()).collect();
    let usernames: HashMap<String, Option<String>> = Profile::find()
        .select_only()
        .column(ProfileColumn::UserId)
        .column(ProfileColumn::Username)
        .filter(ProfileColumn::UserId.is_in(scored_ids))
        .into_tuple::<(String, Option<String>)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let mut scores: Vec<WeeklyScore> = sums
        .into_iter()
        .map(|(user_id, points)| WeeklyScore {
            username: usernames.get(&user_id).cloned().flatten(),
            user_id,
            week_points: points.unwrap_or(0),
        })
        .collect();
    scores.sort_by(|a, b| {
        b.week_points
            .cmp(&a.week_points)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    debug!(
        "Weekly scores for {user_id} ({} to {}): {} friends scored",
        window.start,
        window.end,
        scores.len()
    );
    Ok(scores)
}

/// Keeps every score equal to the maximum. Ties all win.
#[must_use]
pub fn weekly_winners(scores: Vec<WeeklyScore>) -> Vec<WeeklyScore> {
    let Some(max) = scores.iter().map(|s| s.week_points).max() else {
        return Vec::new();
    };
    scores.into_iter().filter(|s| s.week_points == max).collect()
}

/// The user's friends who topped the window. Empty when nobody logged anything.
pub async fn weekly_leaderboard<C>(
    db: &C,
    user_id: &str,
    window: WeekWindow,
) -> Result<Vec<WeeklyScore>>
where
    C: ConnectionTrait,
{
    Ok(weekly_winners(weekly_scores(db, user_id, window).await?))
}

/// Claims the winner celebration for `window` on behalf of `user_id`.
///
/// Returns `true` at most once per (user, `window.end`), and only when `today`
/// is the window's closing Saturday and the window has winners.
pub async fn claim_celebration<C>(
    db: &C,
    user_id: &str,
    window: WeekWindow,
    today: NaiveDate,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    if today != window.end {
        return Ok(false);
    }
    if weekly_leaderboard(db, user_id, window).await?.is_empty() {
        return Ok(false);
    }

    let record = celebration::ActiveModel {
        user_id: Set(user_id.to_string()),
        week_end: Set(window.end),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let inserted = Celebration::insert(record)
        .on_conflict(
            OnConflict::columns([celebration::Column::UserId, celebration::Column::WeekEnd])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    if inserted > 0 {
        info!("Celebrating week ending {} for {user_id}", window.end);
    }
    Ok(inserted > 0)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{core::ledger, entities::Choice, test_utils::*};

    #[test]
    fn test_last_closed_week_midweek() {
        // Wednesday 2024-01-10
        let window = last_closed_week(date(2024, 1, 10));
        assert_eq!(window.start, date(2023, 12, 31));
        assert_eq!(window.end, date(2024, 1, 6));
    }

    #[test]
    fn test_last_closed_week_on_saturday_includes_today() {
        let window = last_closed_week(date(2024, 1, 13));
        assert_eq!(window.start, date(2024, 1, 7));
        assert_eq!(window.end, date(2024, 1, 13));
    }

    #[test]
    fn test_last_closed_week_on_sunday() {
        let window = last_closed_week(date(2024, 1, 14));
        assert_eq!(window.end, date(2024, 1, 13));
        assert_eq!(window.start, date(2024, 1, 7));
    }

    #[test]
    fn test_last_closed_week_is_always_sunday_to_saturday() {
        let mut day = date(2024, 2, 20);
        for _ in 0..14 {
            let window = last_closed_week(day);
            assert_eq!(window.start.weekday(), chrono::Weekday::Sun);
            assert_eq!(window.end.weekday(), chrono::Weekday::Sat);
            assert!(window.end <= day);
            assert!(day.signed_duration_since(window.end).num_days() < 7);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_week_window_contains_bounds() {
        let window = last_closed_week(date(2024, 1, 10));
        assert!(window.contains(window.start));
        assert!(window.contains(window.end));
        assert!(!window.contains(date(2024, 1, 7)));
    }

    fn score(user_id: &str, week_points: i64) -> WeeklyScore {
        WeeklyScore {
            user_id: user_id.to_string(),
            username: None,
            week_points,
        }
    }

    #[test]
    fn test_weekly_winners_includes_ties() {
        let winners = weekly_winners(vec![score("a", 20), score("b", 20), score("c", 10)]);
        let ids: Vec<&str> = winners.iter().map(|w| w.user_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(weekly_winners(Vec::new()).is_empty());
    }

    async fn setup_friends() -> Result<DatabaseConnection> {
        let db = setup_test_db().await?;
        create_test_profile(&db, "a_id", "anna").await?;
        create_test_profile(&db, "b_id", "ben").await?;
        create_test_profile(&db, "c_id", "cleo").await?;
        create_test_profile(&db, "d_id", "dan").await?;
        make_friends(&db, "a_id", "ben").await?;
        make_friends(&db, "c_id", "anna").await?;
        Ok(db)
    }

    async fn log(db: &DatabaseConnection, user_id: &str, day: NaiveDate, choice: Choice) -> Result<()> {
        ledger::upsert_entry(db, user_id, day, choice, date(2024, 12, 31)).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_weekly_leaderboard_ties_all_win() -> Result<()> {
        let db = setup_friends().await?;
        let window = last_closed_week(date(2024, 1, 10));

        // anna 20, ben 20, cleo 10 inside 2023-12-31..2024-01-06
        log(&db, "a_id", date(2023, 12, 31), Choice::Healthy).await?;
        log(&db, "a_id", date(2024, 1, 6), Choice::Healthy).await?;
        log(&db, "b_id", date(2024, 1, 2), Choice::Healthy).await?;
        log(&db, "b_id", date(2024, 1, 3), Choice::Healthy).await?;
        log(&db, "c_id", date(2024, 1, 4), Choice::Healthy).await?;
        // Outside the window
        log(&db, "c_id", date(2024, 1, 7), Choice::Healthy).await?;
        log(&db, "c_id", date(2024, 1, 8), Choice::Healthy).await?;
        // Not a friend of anna
        log(&db, "d_id", date(2024, 1, 2), Choice::Healthy).await?;
        log(&db, "d_id", date(2024, 1, 3), Choice::Healthy).await?;
        log(&db, "d_id", date(2024, 1, 4), Choice::Healthy).await?;

        let winners = weekly_leaderboard(&db, "a_id", window).await?;
        let mut ids: Vec<&str> = winners.iter().map(|w| w.user_id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a_id", "b_id"]);
        assert!(winners.iter().all(|w| w.week_points == 20));
        assert!(winners.iter().any(|w| w.username.as_deref() == Some("ben")));

        let scores = weekly_scores(&db, "a_id", window).await?;
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[2].user_id, "c_id");
        assert_eq!(scores[2].week_points, 10);

        Ok(())
    }

    #[tokio::test]
    async fn test_weekly_leaderboard_is_scoped_to_viewer_friends() -> Result<()> {
        let db = setup_friends().await?;
        let window = last_closed_week(date(2024, 1, 10));
        log(&db, "c_id", date(2024, 1, 2), Choice::Healthy).await?;
        log(&db, "b_id", date(2024, 1, 2), Choice::Junk).await?;

        // ben is friends with anna only, cleo is not in his set
        let winners = weekly_leaderboard(&db, "b_id", window).await?;
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].user_id, "b_id");
        assert_eq!(winners[0].week_points, -10);

        Ok(())
    }

    #[tokio::test]
    async fn test_weekly_leaderboard_empty_week() -> Result<()> {
        let db = setup_friends().await?;
        let window = last_closed_week(date(2024, 1, 10));
        log(&db, "a_id", date(2024, 1, 8), Choice::Healthy).await?;

        assert!(weekly_leaderboard(&db, "a_id", window).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_claim_celebration_once_per_week_on_saturday() -> Result<()> {
        let db = setup_friends().await?;
        let saturday = date(2024, 1, 13);
        let window = last_closed_week(saturday);
        log(&db, "a_id", date(2024, 1, 8), Choice::Healthy).await?;

        assert!(claim_celebration(&db, "a_id", window, saturday).await?);
        assert!(!claim_celebration(&db, "a_id", window, saturday).await?);

        // Another user's claim is independent
        assert!(claim_celebration(&db, "b_id", window, saturday).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_claim_celebration_not_on_other_days() -> Result<()> {
        let db = setup_friends().await?;
        let sunday = date(2024, 1, 14);
        let window = last_closed_week(sunday);
        log(&db, "a_id", date(2024, 1, 8), Choice::Healthy).await?;

        assert!(!claim_celebration(&db, "a_id", window, sunday).await?);
        assert_eq!(Celebration::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_claim_celebration_needs_winners() -> Result<()> {
        let db = setup_friends().await?;
        let saturday = date(2024, 1, 13);
        let window = last_closed_week(saturday);

        assert!(!claim_celebration(&db, "a_id", window, saturday).await?);
        assert_eq!(Celebration::find().count(&db).await?, 0);

        Ok(())
    }
}
