//! Friendship graph business logic - Requests, acceptance and friend lists.
//!
//! Edges are directed (requester → recipient) so the pending inbox knows who
//! asked, but friendship itself is symmetric: once accepted, an edge counts in
//! both directions. [`effective_friend_ids`] is the one place that folds both
//! directions together; the friend list and the weekly leaderboard build on it.

use crate::{
    core::{profile, username},
    entities::{
        Friendship, FriendshipStatus, Profile, ProfileColumn, friendship, friendship::pair_key,
    },
    errors::{Error, Result, is_unique_violation},
};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// A freshly created pending request together with its resolved recipient.
#[derive(Debug, Clone)]
pub struct FriendRequest {
    /// The stored edge
    pub edge: friendship::Model,
    /// Who the request went to
    pub recipient: username::UserSummary,
}

/// An incoming request waiting for the caller's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    /// Edge id, used to accept or reject
    pub id: i64,
    /// Who sent it
    pub requester_user_id: String,
    /// Sender's username, if they have chosen one
    pub username: Option<String>,
    /// When it was sent
    pub created_at: DateTime<Utc>,
}

/// One row of the friends list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendStanding {
    /// Friend's user id
    pub user_id: String,
    /// Friend's username, if chosen
    pub username: Option<String>,
    /// Friend's all-time points
    pub total_points: i64,
}

/// Sends a friend request from `requester_user_id` to the holder of `target_username`.
///
/// Any stale edge between the two (a pending request in either direction) is
/// replaced by a fresh pending edge in the same transaction.
///
/// # Errors
/// * [`Error::UserNotFound`] if the username does not resolve
/// * [`Error::SelfReference`] if it resolves to the requester
/// * [`Error::AlreadyFriends`] if an accepted edge exists in either direction
/// * [`Error::DuplicateFriendship`] if a concurrent request won the race
pub async fn request_friend(
    db: &DatabaseConnection,
    requester_user_id: &str,
    target_username: &str,
) -> Result<FriendRequest> {
    let target = username::resolve_username(db, target_username).await?;
    if target.user_id == requester_user_id {
        return Err(Error::SelfReference);
    }

    let key = pair_key(requester_user_id, &target.user_id);
    let txn = db.begin().await?;

    profile::require_profile(&txn, requester_user_id).await?;

    let existing = Friendship::find()
        .filter(friendship::Column::PairKey.eq(key.as_str()))
        .one(&txn)
        .await?;
    if existing.is_some_and(|edge| edge.status == FriendshipStatus::Accepted) {
        return Err(Error::AlreadyFriends {
            username: target.username,
        });
    }

    let cleared = Friendship::delete_many()
        .filter(friendship::Column::PairKey.eq(key.as_str()))
        .exec(&txn)
        .await?;
    if cleared.rows_affected > 0 {
        debug!("Cleared stale request between {requester_user_id} and {}", target.user_id);
    }

    let edge = insert_pending_edge(&txn, requester_user_id, &target.user_id).await?;

    txn.commit().await?;

    info!(
        "Friend request {} sent from {requester_user_id} to {}",
        edge.id, target.user_id
    );
    Ok(FriendRequest {
        edge,
        recipient: target,
    })
}

/// Inserts a pending edge from `requester_user_id` to `recipient_user_id`.
///
/// The unique `pair_key` rejects a second edge for the same unordered pair,
/// whichever direction it points.
///
/// # Errors
/// [`Error::DuplicateFriendship`] if the pair already has an edge
async fn insert_pending_edge<C>(
    db: &C,
    requester_user_id: &str,
    recipient_user_id: &str,
) -> Result<friendship::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let edge = friendship::ActiveModel {
        requester_user_id: Set(requester_user_id.to_string()),
        recipient_user_id: Set(recipient_user_id.to_string()),
        pair_key: Set(pair_key(requester_user_id, recipient_user_id)),
        status: Set(FriendshipStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match edge.insert(db).await {
        Ok(edge) => Ok(edge),
        Err(e) if is_unique_violation(&e) => Err(Error::DuplicateFriendship),
        Err(e) => Err(e.into()),
    }
}

/// Accepts a pending request addressed to `recipient_user_id`.
///
/// # Errors
/// [`Error::RequestNotFound`] if no pending edge with that id is addressed to
/// the recipient.
pub async fn accept_request<C>(
    db: &C,
    recipient_user_id: &str,
    edge_id: i64,
) -> Result<friendship::Model>
where
    C: ConnectionTrait,
{
    let edge = Friendship::find_by_id(edge_id)
        .filter(friendship::Column::RecipientUserId.eq(recipient_user_id))
        .filter(friendship::Column::Status.eq(FriendshipStatus::Pending))
        .one(db)
        .await?
        .ok_or(Error::RequestNotFound { id: edge_id })?;

    let mut active: friendship::ActiveModel = edge.into();
    active.status = Set(FriendshipStatus::Accepted);
    active.updated_at = Set(Utc::now());
    let accepted = active.update(db).await?;

    info!(
        "Friend request {edge_id} accepted: {} and {recipient_user_id} are now friends",
        accepted.requester_user_id
    );
    Ok(accepted)
}

/// Deletes a request addressed to `recipient_user_id`.
///
/// Deleting an edge that does not exist is not an error.
///
/// # Returns
/// Number of edges removed (0 or 1)
pub async fn reject_request<C>(db: &C, recipient_user_id: &str, edge_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = Friendship::delete_many()
        .filter(friendship::Column::Id.eq(edge_id))
        .filter(friendship::Column::RecipientUserId.eq(recipient_user_id))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        info!("Friend request {edge_id} rejected by {recipient_user_id}");
    } else {
        debug!("Friend request {edge_id} already gone");
    }
    Ok(result.rows_affected)
}

/// Pending requests addressed to `user_id`, oldest first, with sender usernames.
pub async fn list_pending_requests<C>(db: &C, user_id: &str) -> Result<Vec<PendingRequest>>
where
    C: ConnectionTrait,
{
    let rows = Friendship::find()
        .find_also_related(Profile)
        .filter(friendship::Column::RecipientUserId.eq(user_id))
        .filter(friendship::Column::Status.eq(FriendshipStatus::Pending))
        .order_by_asc(friendship::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(edge, requester)| PendingRequest {
            id: edge.id,
            requester_user_id: edge.requester_user_id,
            username: requester.and_then(|p| p.username),
            created_at: edge.created_at,
        })
        .collect())
}

/// The user plus everyone linked to them by an accepted edge, in either direction.
pub async fn effective_friend_ids<C>(db: &C, user_id: &str) -> Result<Vec<String>>
where
    C: ConnectionTrait,
{
    let edges = Friendship::find()
        .filter(friendship::Column::Status.eq(FriendshipStatus::Accepted))
        .filter(
            Condition::any()
                .add(friendship::Column::RequesterUserId.eq(user_id))
                .add(friendship::Column::RecipientUserId.eq(user_id)),
        )
        .order_by_asc(friendship::Column::Id)
        .all(db)
        .await?;

    let mut ids = vec![user_id.to_string()];
    for edge in &edges {
        let other = edge.other_user(user_id);
        if !ids.iter().any(|id| id == other) {
            ids.push(other.to_string());
        }
    }
    Ok(ids)
}

/// The effective friend set with usernames and totals, highest total first.
///
/// Ties keep profile creation order.
pub async fn list_friends<C>(db: &C, user_id: &str) -> Result<Vec<FriendStanding>>
where
    C: ConnectionTrait,
{
    let ids = effective_friend_ids(db, user_id).await?;

    let profiles = Profile::find()
        .filter(ProfileColumn::UserId.is_in(ids))
        .order_by_desc(ProfileColumn::TotalPoints)
        .order_by_asc(ProfileColumn::Id)
        .all(db)
        .await?;

    Ok(profiles
        .into_iter()
        .map(|p| FriendStanding {
            user_id: p.user_id,
            username: p.username,
            total_points: p.total_points,
        })
        .collect())
}
