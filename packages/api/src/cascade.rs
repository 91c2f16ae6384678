//! Removal of everything a member owns.
//!
//! Shared by the admin members list, the `deleteUser` callable and the
//! user-deleted trigger. Steps run in a fixed order: identity record, profile
//! document, owned houses. A missing identity record is logged and skipped so a
//! half-finished earlier removal can be completed.

use store::{DocumentStore, Repository};

use crate::auth::IdentityProvider;
use crate::error::{Error, Result};
use crate::models::{House, User};

/// What a cascade actually removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub identity_removed: bool,
    pub profile_removed: bool,
    pub houses_removed: usize,
}

/// Delete the identity record, the `users/{uid}` document and every house
/// whose `userId` is `uid`.
pub async fn delete_user_cascade<I, S>(
    identity: &I,
    repo: &Repository<S>,
    uid: &str,
) -> Result<CascadeReport>
where
    I: IdentityProvider,
    S: DocumentStore,
{
    let mut report = CascadeReport {
        identity_removed: delete_identity(identity, uid).await?,
        ..CascadeReport::default()
    };

    if repo.get::<User>(uid).await?.is_some() {
        repo.delete::<User>(uid)
            .await
            .map_err(Error::failed("delete user"))?;
        report.profile_removed = true;
    }
    report.houses_removed = delete_houses(repo, uid).await?;

    tracing::info!(
        %uid,
        identity = report.identity_removed,
        houses = report.houses_removed,
        "user deleted"
    );
    Ok(report)
}

/// Clean up after a profile document that is already gone: the identity
/// record and the member's houses.
pub async fn purge_user_data<I, S>(
    identity: &I,
    repo: &Repository<S>,
    uid: &str,
) -> Result<CascadeReport>
where
    I: IdentityProvider,
    S: DocumentStore,
{
    let identity_removed = delete_identity(identity, uid).await?;
    let houses_removed = delete_houses(repo, uid).await?;
    Ok(CascadeReport {
        identity_removed,
        profile_removed: false,
        houses_removed,
    })
}

async fn delete_identity<I: IdentityProvider>(identity: &I, uid: &str) -> Result<bool> {
    match identity.delete_account(uid).await {
        Ok(()) => Ok(true),
        Err(Error::NotFound { .. }) => {
            tracing::warn!(%uid, "no identity record to delete");
            Ok(false)
        }
        Err(Error::Authentication(message)) if message == "Account not found" => {
            tracing::warn!(%uid, "no identity record to delete");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

async fn delete_houses<S: DocumentStore>(repo: &Repository<S>, uid: &str) -> Result<usize> {
    let houses = repo.find_by::<House>("userId", uid).await?;
    for house in &houses {
        repo.delete::<House>(&house.id)
            .await
            .map_err(Error::failed("delete house"))?;
    }
    Ok(houses.len())
}
