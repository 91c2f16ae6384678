//! Error taxonomy for the application services.
//!
//! Every variant renders as a message fit to show the user as-is. Nothing is
//! retried; callers show the message and let the user try again.

use store::StoreError;
use thiserror::Error;

/// Result alias for application services.
pub type Result<T> = std::result::Result<T, Error>;

/// Local form-validation failures, reported before any backend call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Owner Name must contain alphabets only.")]
    OwnerName,
    #[error("Phone Number must be exactly 10 digits.")]
    Phone,
    #[error("House Number is required.")]
    HouseNumber,
    #[error("Block Name is required for Apartments.")]
    Block,
    #[error("Tap your house on the map to choose its location.")]
    MissingLocation,
    #[error("The selected location is outside the neighborhood.")]
    OutOfBounds,
    #[error("Houses can only be added as occupied, for rent or for sale.")]
    InitialStatus,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Name must contain only letters.")]
    Name,
    #[error("Invalid email address")]
    Email,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("{0} is required")]
    Required(&'static str),
    #[error("Time must be given as HH:MM")]
    Time,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The soft uniqueness check found an existing house with this identity.
    #[error("House {0} is already registered.")]
    DuplicateHouse(String),

    #[error("Username {0} is already taken.")]
    DuplicateUsername(String),

    #[error("You have already registered a house.")]
    HouseAlreadyRegistered,

    #[error("{0}")]
    Authentication(String),

    #[error("Your account is waiting for admin approval.")]
    AccountPending,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The record exists but is not in a state the action applies to.
    #[error("{0}")]
    InvalidState(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// A backend write failed while carrying out a user action.
    #[error("Failed to {action}: {source}")]
    Failed {
        action: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Backend error: {0}")]
    Store(#[from] StoreError),

    #[error("Identity service error: {0}")]
    Identity(String),
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Wrap a store failure with the action the user attempted.
    pub fn failed(action: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Failed { action, source }
    }

    /// Validation and duplicate errors are reported inline, before or right
    /// after a lookup.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::DuplicateHouse(_)
                | Self::DuplicateUsername(_)
                | Self::HouseAlreadyRegistered
        )
    }
}
