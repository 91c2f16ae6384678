//! Single-process wiring: identity, documents, callable and trigger share one
//! in-memory backend. Nothing outlives the process.

use std::sync::Arc;

use api::MemoryIdentity;
use axum::Router;
use store::{MemoryStore, Repository};
use tokio::task::JoinHandle;

use crate::callable::{router, AppState};
use crate::settings::Settings;
use crate::{bootstrap, trigger};

pub struct Local {
    pub identity: Arc<MemoryIdentity>,
    pub repo: Repository<MemoryStore>,
    /// Uid of the bootstrapped admin, when one is configured.
    pub admin: Option<String>,
    watcher: JoinHandle<()>,
}

impl Local {
    /// Provision the admin and start the user-deleted trigger.
    pub async fn start(settings: &Settings) -> api::Result<Self> {
        let identity = Arc::new(MemoryIdentity::new());
        let repo = Repository::new(MemoryStore::new());

        let admin = bootstrap::ensure_admin(identity.as_ref(), &repo, &settings.admin).await?;
        let watcher = trigger::start(Arc::clone(&identity), repo.clone()).await;

        Ok(Self {
            identity,
            repo,
            admin,
            watcher,
        })
    }

    pub fn router(&self) -> Router {
        router(AppState {
            identity: Arc::clone(&self.identity),
            repo: self.repo.clone(),
        })
    }
}

impl Drop for Local {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}
