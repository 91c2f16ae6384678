//! # Live mirror of the shared collections
//!
//! [`LiveMirror`] subscribes to houses, users, events and meetings and keeps a
//! [`Collections`] snapshot current. Each remote change replaces the whole
//! affected set; nothing is patched incrementally. Observers follow the mirror
//! through a `watch` receiver.
//!
//! The subscription tasks live in a [`JoinSet`] and are aborted by
//! [`stop`](LiveMirror::stop) or when the mirror is dropped.

use std::sync::Arc;

use store::{DocumentStore, Record, Repository, Snapshots, Stored};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::models::{Event, House, Meeting, User};
use crate::visibility::{visible_houses, HouseView, Viewer};

/// Latest snapshot of every shared collection.
#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub houses: Arc<Vec<Stored<House>>>,
    pub users: Arc<Vec<Stored<User>>>,
    pub events: Arc<Vec<Stored<Event>>>,
    pub meetings: Arc<Vec<Stored<Meeting>>>,
}

impl Collections {
    pub fn pending_houses(&self) -> Vec<&Stored<House>> {
        self.houses.iter().filter(|h| h.is_pending()).collect()
    }

    pub fn pending_users(&self) -> Vec<&Stored<User>> {
        self.users.iter().filter(|u| !u.is_active()).collect()
    }

    pub fn active_members(&self) -> Vec<&Stored<User>> {
        self.users.iter().filter(|u| u.is_active()).collect()
    }

    /// The member's house, approved or not.
    pub fn house_of(&self, uid: &str) -> Option<&Stored<House>> {
        self.houses.iter().find(|h| h.is_owned_by(uid))
    }

    /// The member's house while it still awaits approval.
    pub fn pending_house_of(&self, uid: &str) -> Option<&Stored<House>> {
        self.house_of(uid).filter(|h| h.is_pending())
    }

    /// An active resident with no house yet is prompted to register one.
    pub fn needs_house_registration(&self, viewer: &Viewer) -> bool {
        viewer.is_active() && !viewer.role.is_privileged() && self.house_of(&viewer.uid).is_none()
    }

    /// The map for `viewer`.
    pub fn map_for(&self, viewer: &Viewer) -> Vec<HouseView> {
        visible_houses(viewer, &self.houses)
    }
}

pub struct LiveMirror {
    rx: watch::Receiver<Collections>,
    tasks: JoinSet<()>,
}

impl LiveMirror {
    /// Open one subscription per collection.
    pub fn start<S: DocumentStore>(repo: &Repository<S>) -> Self {
        let (tx, rx) = watch::channel(Collections::default());
        let tx = Arc::new(tx);
        let mut tasks = JoinSet::new();

        tasks.spawn(follow(repo.subscribe::<House>(), Arc::clone(&tx), |c, v| {
            c.houses = v
        }));
        tasks.spawn(follow(repo.subscribe::<User>(), Arc::clone(&tx), |c, v| {
            c.users = v
        }));
        tasks.spawn(follow(repo.subscribe::<Event>(), Arc::clone(&tx), |c, v| {
            c.events = v
        }));
        tasks.spawn(follow(repo.subscribe::<Meeting>(), tx, |c, v| {
            c.meetings = v
        }));

        tracing::debug!("live mirror started");
        Self { rx, tasks }
    }

    pub fn current(&self) -> Collections {
        self.rx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Collections> {
        self.rx.clone()
    }

    /// Release every subscription.
    pub fn stop(mut self) {
        self.tasks.abort_all();
        tracing::debug!("live mirror stopped");
    }
}

async fn follow<T, F>(
    mut snapshots: Snapshots<T>,
    tx: Arc<watch::Sender<Collections>>,
    apply: F,
) where
    T: Record,
    F: Fn(&mut Collections, Arc<Vec<Stored<T>>>) + Send + 'static,
{
    while let Some(records) = snapshots.next().await {
        let records = Arc::new(records);
        tx.send_modify(|c| apply(c, records));
    }
}
