//! User-deleted trigger.
//!
//! Watches the `users` collection and, whenever a profile document disappears,
//! removes that member's identity record and houses. Failures are logged and
//! never stop the watcher.

use std::collections::BTreeSet;
use std::sync::Arc;

use api::models::User;
use api::{purge_user_data, IdentityProvider};
use store::{DocumentStore, Record, Repository, Subscription};
use tokio::task::JoinHandle;

fn ids(snapshot: &[store::Document]) -> BTreeSet<String> {
    snapshot.iter().map(|d| d.id.clone()).collect()
}

/// Start watching. The returned task runs until aborted; the current set of
/// users is taken as the baseline before this returns.
pub async fn start<I, S>(identity: Arc<I>, repo: Repository<S>) -> JoinHandle<()>
where
    I: IdentityProvider + 'static,
    S: DocumentStore + 'static,
{
    let mut subscription = repo.store().subscribe(User::COLLECTION);
    let baseline = match subscription.next().await {
        Some(snapshot) => ids(&snapshot),
        None => BTreeSet::new(),
    };
    tracing::info!(users = baseline.len(), "user-deleted trigger armed");

    tokio::spawn(watch(identity, repo, subscription, baseline))
}

async fn watch<I, S>(
    identity: Arc<I>,
    repo: Repository<S>,
    mut subscription: Subscription,
    mut known: BTreeSet<String>,
) where
    I: IdentityProvider,
    S: DocumentStore,
{
    while let Some(snapshot) = subscription.next().await {
        let current = ids(&snapshot);
        for uid in known.difference(&current) {
            match purge_user_data(identity.as_ref(), &repo, uid).await {
                Ok(report) => tracing::info!(
                    %uid,
                    identity = report.identity_removed,
                    houses = report.houses_removed,
                    "cleaned up after deleted user"
                ),
                Err(e) => tracing::error!(%uid, error = %e, "user cleanup failed"),
            }
        }
        known = current;
    }
    tracing::debug!("users subscription closed");
}
