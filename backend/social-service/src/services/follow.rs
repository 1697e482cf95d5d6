//! Relationship Toggle: follow/unfollow with both sides of the edge kept in step.
//!
//! Which way the toggle goes is decided by the actor's `following` set. The
//! target's `followers` set is written first; the deciding write comes last, so a
//! retry after a partial failure repeats the same direction and converges.
use super::{NotificationLedger, Stores};
use crate::domain::models::{AccountSet, NotificationType};
use crate::error::{AppError, Result};
use crate::repository::{AccountStore, StoreResult};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowOutcome {
    /// Whether the actor follows the target after the toggle
    pub following: bool,
}

impl FollowOutcome {
    pub fn message(&self) -> &'static str {
        if self.following {
            "User followed successfully"
        } else {
            "User unfollowed successfully"
        }
    }
}

#[derive(Clone)]
pub struct RelationshipToggle {
    stores: Stores,
    ledger: NotificationLedger,
}

impl RelationshipToggle {
    pub fn new(stores: Stores, ledger: NotificationLedger) -> Self {
        Self { stores, ledger }
    }

    pub async fn toggle_follow(&self, actor: Uuid, target: Uuid) -> Result<FollowOutcome> {
        if actor == target {
            return Err(AppError::InvalidOperation("Cannot follow yourself".into()));
        }

        let actor_account = self.stores.require_account(actor).await?;
        self.stores.require_account(target).await?;

        let following = !actor_account.is_following(target);
        if following {
            self.apply(actor, target, SetWrite::Add).await?;
            self.ledger
                .record_quietly(actor, target, NotificationType::Follow, None)
                .await;
            info!(actor = %actor, target = %target, "Account followed");
        } else {
            // The earlier follow notification stays in the recipient's ledger
            self.apply(actor, target, SetWrite::Remove).await?;
            info!(actor = %actor, target = %target, "Account unfollowed");
        }

        Ok(FollowOutcome { following })
    }

    async fn apply(&self, actor: Uuid, target: Uuid, write: SetWrite) -> Result<()> {
        let accounts: &dyn AccountStore = self.stores.accounts.as_ref();

        let found = self
            .stores
            .call("accounts.followers", || {
                write.run(accounts, target, AccountSet::Followers, actor)
            })
            .await?;
        if !found {
            return Err(AppError::NotFound("User not found".into()));
        }

        match self
            .stores
            .call("accounts.following", || {
                write.run(accounts, actor, AccountSet::Following, target)
            })
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => {
                error!(
                    actor = %actor,
                    target = %target,
                    repair = "follow_symmetry",
                    "Actor vanished after target followers were updated"
                );
                Err(AppError::NotFound("User not found".into()))
            }
            Err(e) => {
                error!(
                    actor = %actor,
                    target = %target,
                    error = %e,
                    repair = "follow_symmetry",
                    "Following set not updated; follower edge is one-sided"
                );
                Err(e.into())
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum SetWrite {
    Add,
    Remove,
}

impl SetWrite {
    pub(crate) fn run<'a>(
        self,
        accounts: &'a dyn AccountStore,
        id: Uuid,
        set: AccountSet,
        member: Uuid,
    ) -> Pin<Box<dyn Future<Output = StoreResult<bool>> + Send + 'a>> {
        match self {
            SetWrite::Add => accounts.add_to_set(id, set, member),
            SetWrite::Remove => accounts.remove_from_set(id, set, member),
        }
    }
}
