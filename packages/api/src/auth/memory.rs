use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::identity::{AuthUser, IdentityProvider};
use super::password::Credential;
use crate::error::{Error, Result};

/// In-process identity service for testing and local development.
///
/// Passwords are stored as Argon2id hashes; id tokens are random and valid
/// until the account signs out or is deleted.
#[derive(Clone, Debug, Default)]
pub struct MemoryIdentity {
    inner: Arc<Mutex<Accounts>>,
}

#[derive(Debug, Default)]
struct Accounts {
    /// uid -> account
    accounts: HashMap<String, Account>,
    /// normalised email -> uid
    by_email: HashMap<String, String>,
    /// id token -> uid
    tokens: HashMap<String, String>,
}

#[derive(Debug)]
struct Account {
    email: String,
    credential: Credential,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Accounts> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether an account exists for `uid`.
    pub fn has_account(&self, uid: &str) -> bool {
        self.lock().accounts.contains_key(uid)
    }

    fn issue_token(&self, uid: &str, email: &str) -> AuthUser {
        let token = uuid::Uuid::new_v4().to_string();
        self.lock().tokens.insert(token.clone(), uid.to_string());
        AuthUser {
            uid: uid.to_string(),
            email: email.to_string(),
            id_token: token,
        }
    }
}

impl IdentityProvider for MemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = email.trim().to_lowercase();
        let credential = Credential::create(password)?;
        if self.lock().by_email.contains_key(&email) {
            return Err(Error::Authentication(
                "An account with this email already exists".to_string(),
            ));
        }

        let uid = uuid::Uuid::new_v4().simple().to_string();
        {
            let mut accounts = self.lock();
            accounts.by_email.insert(email.clone(), uid.clone());
            accounts.accounts.insert(
                uid.clone(),
                Account {
                    email: email.clone(),
                    credential,
                },
            );
        }
        tracing::info!(%uid, "account created");
        Ok(self.issue_token(&uid, &email))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = email.trim().to_lowercase();
        let found = {
            let accounts = self.lock();
            accounts.by_email.get(&email).and_then(|uid| {
                accounts
                    .accounts
                    .get(uid)
                    .map(|a| (uid.clone(), a.credential.clone()))
            })
        };

        let Some((uid, credential)) = found else {
            return Err(Credential::unknown_account());
        };
        credential.check(password)?;
        Ok(self.issue_token(&uid, &email))
    }

    async fn sign_out(&self, user: &AuthUser) -> Result<()> {
        self.lock().tokens.remove(&user.id_token);
        Ok(())
    }

    async fn verify_token(&self, id_token: &str) -> Result<String> {
        self.lock()
            .tokens
            .get(id_token)
            .cloned()
            .ok_or_else(|| Error::Authentication("Invalid or expired token".to_string()))
    }

    async fn delete_account(&self, uid: &str) -> Result<()> {
        let mut accounts = self.lock();
        let Some(account) = accounts.accounts.remove(uid) else {
            return Err(Error::not_found("account", uid));
        };
        accounts.by_email.remove(&account.email);
        accounts.tokens.retain(|_, owner| owner != uid);
        tracing::info!(%uid, "account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let identity = MemoryIdentity::new();
        let created = identity.sign_up("Asha@Example.com ", "secret1").await.unwrap();
        assert_eq!(created.email, "asha@example.com");

        let signed_in = identity.sign_in("asha@example.com", "secret1").await.unwrap();
        assert_eq!(signed_in.uid, created.uid);
        assert_ne!(signed_in.id_token, created.id_token);

        assert_eq!(
            identity.verify_token(&signed_in.id_token).await.unwrap(),
            created.uid
        );
    }

    #[tokio::test]
    async fn test_rejects_bad_credentials_and_duplicates() {
        let identity = MemoryIdentity::new();
        identity.sign_up("ravi@example.com", "secret1").await.unwrap();

        let dup = identity.sign_up("ravi@example.com", "secret2").await.unwrap_err();
        assert!(matches!(dup, Error::Authentication(_)));

        let wrong = identity.sign_in("ravi@example.com", "nope!!").await.unwrap_err();
        assert_eq!(wrong.to_string(), "Invalid email or password");

        let weak = identity.sign_up("new@example.com", "123").await.unwrap_err();
        assert!(matches!(weak, Error::Authentication(_)));
    }

    #[tokio::test]
    async fn test_sign_out_revokes_token() {
        let identity = MemoryIdentity::new();
        let user = identity.sign_up("a@example.com", "secret1").await.unwrap();
        identity.sign_out(&user).await.unwrap();
        assert!(identity.verify_token(&user.id_token).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_account() {
        let identity = MemoryIdentity::new();
        let user = identity.sign_up("b@example.com", "secret1").await.unwrap();
        identity.delete_account(&user.uid).await.unwrap();

        assert!(!identity.has_account(&user.uid));
        assert!(identity.verify_token(&user.id_token).await.is_err());
        assert!(identity.sign_in("b@example.com", "secret1").await.is_err());
        assert!(matches!(
            identity.delete_account(&user.uid).await,
            Err(Error::NotFound { .. })
        ));
    }
}
