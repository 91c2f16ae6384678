//! # Session context
//!
//! [`SessionContext`] is the one object a client holds for "who is signed in".
//! Its lifecycle:
//!
//! 1. **Startup**: [`SessionContext::new`] starts in the loading state;
//!    [`start`](SessionContext::start) resolves the restored identity (or none).
//! 2. **Identity change**: [`login`](SessionContext::login),
//!    [`register`](SessionContext::register) and
//!    [`logout`](SessionContext::logout) all funnel through
//!    [`on_identity_changed`](SessionContext::on_identity_changed), which reads the
//!    member's `users/{uid}` profile and opens a live subscription so later role or
//!    status changes (an admin approving the account, say) flow into the session.
//! 3. **Teardown**: logout (or dropping the context) aborts the profile watcher.
//!
//! Observers read the current [`AuthState`] with [`state`](SessionContext::state)
//! or follow it with [`watch`](SessionContext::watch).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use store::{DocumentStore, Repository};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::identity::{AuthUser, IdentityProvider};
use crate::error::{Error, Result, ValidationError};
use crate::models::{Role, User, UserStatus};
use crate::validation::{is_valid_email, is_valid_name, require};
use crate::visibility::Viewer;

/// The signed-in member as the session knows them.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub uid: String,
    pub email: String,
    /// `None` when the identity has no profile document.
    pub profile: Option<User>,
}

impl CurrentUser {
    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|p| p.role)
    }

    pub fn is_pending(&self) -> bool {
        self.profile
            .as_ref()
            .map_or(true, |p| p.status == UserStatus::Pending)
    }

    /// The caller identity used for permission checks. An identity without a
    /// profile is treated as a pending resident.
    pub fn viewer(&self) -> Viewer {
        match &self.profile {
            Some(profile) => Viewer::from_profile(profile),
            None => Viewer {
                uid: self.uid.clone(),
                name: self.email.clone(),
                role: Role::Resident,
                status: UserStatus::Pending,
            },
        }
    }
}

/// Authentication state for the application.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<CurrentUser>,
    /// True until the first identity resolution completes.
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

/// Sign-up form contents.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Registration {
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if !is_valid_name(&self.name) {
            return Err(ValidationError::Name);
        }
        require(&self.username, "Username")?;
        if !is_valid_email(&self.email) {
            return Err(ValidationError::Email);
        }
        if self.password.len() < 6 {
            return Err(ValidationError::PasswordTooShort);
        }
        Ok(())
    }
}

/// Shared session state for one client.
pub struct SessionContext<I, S> {
    identity: I,
    repo: Repository<S>,
    state: Arc<watch::Sender<AuthState>>,
    auth: Mutex<Option<AuthUser>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<I, S> SessionContext<I, S>
where
    I: IdentityProvider,
    S: DocumentStore,
{
    pub fn new(identity: I, repo: Repository<S>) -> Self {
        let (tx, _) = watch::channel(AuthState::default());
        Self {
            identity,
            repo,
            state: Arc::new(tx),
            auth: Mutex::new(None),
            watcher: Mutex::new(None),
        }
    }

    /// Resolve the identity restored at startup, if any, and leave the loading state.
    pub async fn start(&self, restored: Option<AuthUser>) -> Result<()> {
        self.on_identity_changed(restored).await
    }

    /// Current state snapshot.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Follow state changes.
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.state.borrow().user.clone()
    }

    /// The signed-in caller, or an authentication error.
    pub fn viewer(&self) -> Result<Viewer> {
        self.current_user()
            .map(|u| u.viewer())
            .ok_or_else(|| Error::Authentication("Not signed in".to_string()))
    }

    /// Bearer token of the signed-in identity.
    pub fn id_token(&self) -> Option<String> {
        lock(&self.auth).as_ref().map(|a| a.id_token.clone())
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    /// Mirror a new identity (or its absence) into the session.
    pub async fn on_identity_changed(&self, user: Option<AuthUser>) -> Result<()> {
        self.stop_watcher();

        let Some(auth) = user else {
            *lock(&self.auth) = None;
            self.state.send_replace(AuthState {
                user: None,
                loading: false,
            });
            return Ok(());
        };

        let profile = self.repo.get::<User>(&auth.uid).await?.map(|p| p.data);
        if profile.is_none() {
            tracing::warn!(uid = %auth.uid, "signed-in identity has no profile document");
        }

        self.state.send_replace(AuthState {
            user: Some(CurrentUser {
                uid: auth.uid.clone(),
                email: auth.email.clone(),
                profile,
            }),
            loading: false,
        });
        self.spawn_watcher(&auth.uid);
        *lock(&self.auth) = Some(auth);
        Ok(())
    }

    /// Keep the session's profile in step with `users/{uid}`.
    fn spawn_watcher(&self, uid: &str) {
        let mut snapshots = self.repo.subscribe::<User>();
        let state = Arc::clone(&self.state);
        let uid = uid.to_string();

        let handle = tokio::spawn(async move {
            while let Some(users) = snapshots.next().await {
                let profile = users.into_iter().find(|u| u.id == uid).map(|u| u.data);
                state.send_if_modified(|s| match s.user.as_mut() {
                    Some(current) if current.uid == uid && current.profile != profile => {
                        tracing::debug!(%uid, "profile changed");
                        current.profile = profile.clone();
                        true
                    }
                    _ => false,
                });
            }
        });
        *lock(&self.watcher) = Some(handle);
    }

    fn stop_watcher(&self) {
        if let Some(handle) = lock(&self.watcher).take() {
            handle.abort();
        }
    }

    /// Create an account and its pending resident profile, then sign in.
    pub async fn register(&self, form: Registration) -> Result<CurrentUser> {
        form.validate()?;

        let username = form.username.trim().to_string();
        let taken = self
            .repo
            .find_by::<User>("username", username.as_str())
            .await?;
        if !taken.is_empty() {
            return Err(Error::DuplicateUsername(username));
        }

        let auth = self.identity.sign_up(&form.email, &form.password).await?;
        let profile = User::new_resident(
            auth.uid.clone(),
            auth.email.clone(),
            username,
            form.name.trim().to_string(),
        );
        self.repo.set(&auth.uid, &profile).await?;
        tracing::info!(uid = %auth.uid, "member registered, awaiting approval");

        self.on_identity_changed(Some(auth)).await?;
        self.current_user()
            .ok_or_else(|| Error::Authentication("Not signed in".to_string()))
    }

    /// Sign in by username: resolve it to the account email, then authenticate.
    pub async fn login(&self, username: &str, password: &str) -> Result<CurrentUser> {
        let matches = self
            .repo
            .find_by::<User>("username", username.trim())
            .await?;
        let Some(profile) = matches.into_iter().next() else {
            return Err(Error::Authentication("Username not found".to_string()));
        };

        let auth = self.identity.sign_in(&profile.email, password).await?;
        tracing::info!(uid = %auth.uid, "signed in");

        self.on_identity_changed(Some(auth)).await?;
        self.current_user()
            .ok_or_else(|| Error::Authentication("Not signed in".to_string()))
    }

    /// Sign out and tear the session down.
    pub async fn logout(&self) -> Result<()> {
        let auth = lock(&self.auth).take();
        if let Some(auth) = &auth {
            self.identity.sign_out(auth).await?;
            tracing::info!(uid = %auth.uid, "signed out");
        }
        self.on_identity_changed(None).await
    }
}

impl<I, S> Drop for SessionContext<I, S> {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.watcher).take() {
            handle.abort();
        }
    }
}
