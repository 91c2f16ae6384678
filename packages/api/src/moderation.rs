//! # Admin moderation
//!
//! Approval queues and member management. Every operation requires an active
//! admin caller.
//!
//! - Houses: [`approve_house`](Moderation::approve_house) moves a pending house to
//!   occupied; [`reject_house`](Moderation::reject_house) deletes it.
//! - Members: [`approve_user`](Moderation::approve_user) activates a pending
//!   account; [`remove_user`](Moderation::remove_user) runs the full
//!   [cascade](crate::cascade). Admin accounts cannot be removed this way.

use serde_json::json;
use store::{DocumentStore, Fields, Repository, Stored};

use crate::auth::IdentityProvider;
use crate::cascade::{delete_user_cascade, CascadeReport};
use crate::error::{Error, Result};
use crate::models::{House, HouseStatus, User, UserStatus};
use crate::visibility::Viewer;

#[derive(Clone, Debug)]
pub struct Moderation<S> {
    repo: Repository<S>,
}

impl<S: DocumentStore> Moderation<S> {
    pub fn new(repo: Repository<S>) -> Self {
        Self { repo }
    }

    pub async fn pending_houses(&self, viewer: &Viewer) -> Result<Vec<Stored<House>>> {
        viewer.require_admin("review houses")?;
        Ok(self.repo.find_by::<House>("status", json!(HouseStatus::Pending)).await?)
    }

    pub async fn pending_users(&self, viewer: &Viewer) -> Result<Vec<Stored<User>>> {
        viewer.require_admin("review members")?;
        Ok(self.repo.find_by::<User>("status", json!(UserStatus::Pending)).await?)
    }

    /// Approved members, sorted by display name.
    pub async fn active_members(&self, viewer: &Viewer) -> Result<Vec<Stored<User>>> {
        viewer.require_admin("manage members")?;
        let mut members = self
            .repo
            .find_by::<User>("status", json!(UserStatus::Active))
            .await?;
        members.sort_by_key(|m| m.display_name().to_lowercase());
        Ok(members)
    }

    async fn pending_house(&self, id: &str) -> Result<Stored<House>> {
        let house = self
            .repo
            .get::<House>(id)
            .await?
            .ok_or_else(|| Error::not_found("House", id))?;
        if !house.is_pending() {
            return Err(Error::InvalidState(format!(
                "House {} is not awaiting approval.",
                house.number
            )));
        }
        Ok(house)
    }

    pub async fn approve_house(&self, viewer: &Viewer, id: &str) -> Result<()> {
        viewer.require_admin("approve houses")?;
        let house = self.pending_house(id).await?;

        let mut patch = Fields::new();
        patch.insert("status".into(), json!(HouseStatus::Occupied));
        self.repo
            .update::<House>(id, patch)
            .await
            .map_err(Error::failed("approve house"))?;
        tracing::info!(%id, number = %house.number, "house approved");
        Ok(())
    }

    pub async fn reject_house(&self, viewer: &Viewer, id: &str) -> Result<()> {
        viewer.require_admin("reject houses")?;
        let house = self.pending_house(id).await?;
        self.repo
            .delete::<House>(id)
            .await
            .map_err(Error::failed("reject house"))?;
        tracing::info!(%id, number = %house.number, "house rejected");
        Ok(())
    }

    pub async fn approve_user(&self, viewer: &Viewer, uid: &str) -> Result<()> {
        viewer.require_admin("approve members")?;
        let user = self
            .repo
            .get::<User>(uid)
            .await?
            .ok_or_else(|| Error::not_found("User", uid))?;
        if user.is_active() {
            return Err(Error::InvalidState(format!(
                "{} is already active.",
                user.display_name()
            )));
        }

        let mut patch = Fields::new();
        patch.insert("status".into(), json!(UserStatus::Active));
        self.repo
            .update::<User>(uid, patch)
            .await
            .map_err(Error::failed("approve user"))?;
        tracing::info!(%uid, "member approved");
        Ok(())
    }

    /// Remove a member along with their identity record and houses.
    pub async fn remove_user<I: IdentityProvider>(
        &self,
        viewer: &Viewer,
        identity: &I,
        uid: &str,
    ) -> Result<CascadeReport> {
        viewer.require_admin("remove members")?;
        if uid == viewer.uid {
            return Err(Error::PermissionDenied(
                "you cannot remove your own account".to_string(),
            ));
        }
        if let Some(target) = self.repo.get::<User>(uid).await? {
            if target.role.is_admin() {
                return Err(Error::PermissionDenied(
                    "admin accounts cannot be removed".to_string(),
                ));
            }
        }
        delete_user_cascade(identity, &self.repo, uid).await
    }
}
