use uuid::Uuid;

use crate::domain::{FollowOutcome, UnfollowOutcome};
use crate::error::RepoError;
use crate::ports::FollowRepository;

/// Subscribe `user_id` to `author_id`.
///
/// Following yourself and following twice are both no-ops.
pub async fn follow(
    follows: &dyn FollowRepository,
    user_id: Uuid,
    author_id: Uuid,
) -> Result<FollowOutcome, RepoError> {
    if user_id == author_id {
        return Ok(FollowOutcome::SelfFollow);
    }
    if follows.exists(user_id, author_id).await? {
        return Ok(FollowOutcome::AlreadyFollowing);
    }

    match follows.insert(user_id, author_id).await {
        Ok(_) => {
            tracing::info!(%user_id, %author_id, "Follow created");
            Ok(FollowOutcome::Followed)
        }
        // Lost a race with a concurrent request for the same pair.
        Err(RepoError::Constraint(_)) => Ok(FollowOutcome::AlreadyFollowing),
        Err(e) => Err(e),
    }
}

/// Remove the subscription if there is one.
pub async fn unfollow(
    follows: &dyn FollowRepository,
    user_id: Uuid,
    author_id: Uuid,
) -> Result<UnfollowOutcome, RepoError> {
    let removed = follows.delete(user_id, author_id).await?;
    if removed == 0 {
        return Ok(UnfollowOutcome::NotFollowing);
    }

    tracing::info!(%user_id, %author_id, "Follow removed");
    Ok(UnfollowOutcome::Unfollowed)
}
