//! First-admin bootstrap.
//!
//! Nobody can approve the first member without an admin, so the functions
//! create (or promote) one from settings at startup.

use api::models::{Role, User, UserStatus};
use api::IdentityProvider;
use store::{DocumentStore, Repository};

use crate::settings::Admin;

/// Ensure the configured admin account exists with an active admin profile.
/// Returns the admin's uid, or `None` when no admin is configured.
pub async fn ensure_admin<I, S>(
    identity: &I,
    repo: &Repository<S>,
    admin: &Admin,
) -> api::Result<Option<String>>
where
    I: IdentityProvider,
    S: DocumentStore,
{
    let (Some(email), Some(password)) = (admin.email.as_deref(), admin.password.as_deref()) else {
        tracing::debug!("no admin configured");
        return Ok(None);
    };

    let auth = match identity.sign_in(email, password).await {
        Ok(auth) => auth,
        Err(api::Error::Authentication(_)) => identity.sign_up(email, password).await?,
        Err(e) => return Err(e),
    };

    let profile = match repo.get::<User>(&auth.uid).await? {
        Some(existing) if existing.role == Role::Admin && existing.is_active() => {
            tracing::debug!(uid = %auth.uid, "admin already provisioned");
            return Ok(Some(auth.uid));
        }
        Some(existing) => User {
            role: Role::Admin,
            status: UserStatus::Active,
            ..existing.data
        },
        None => User {
            role: Role::Admin,
            status: UserStatus::Active,
            ..User::new_resident(
                auth.uid.clone(),
                auth.email.clone(),
                admin.username.clone(),
                admin.name.clone(),
            )
        },
    };
    repo.set(&auth.uid, &profile).await?;
    tracing::info!(uid = %auth.uid, "admin provisioned");
    Ok(Some(auth.uid))
}
