//! # API crate — application services for the neighborhood app
//!
//! Everything a client does goes through this crate. Auth is delegated to a
//! managed identity service behind [`auth::IdentityProvider`]; data lives in a
//! managed document database behind [`store::DocumentStore`].
//!
//! ## Modules
//!
//! | Module | Feature gate | Purpose |
//! |--------|-------------|---------|
//! | [`auth`] | `remote` for the REST client | Identity providers, password hashing, the session context |
//! | [`cascade`] | — | Removing a member's identity record, profile and houses |
//! | [`community`] | — | Events and meeting minutes with their note threads |
//! | [`config`] | — | `neighborhood.toml`: map centre, bounds and zoom |
//! | [`error`] | — | User-facing error taxonomy |
//! | [`live`] | — | Live mirror of the shared collections and derived state |
//! | [`models`] | — | Stored records: `User`, `House`, `Event`, `Meeting` |
//! | [`moderation`] | — | Approval queues and member management |
//! | [`registry`] | — | House submission, admin add / edit / delete, duplicate check |
//! | [`validation`] | — | Form field checks |
//! | [`visibility`] | — | Role-gated views of the map |
//!
//! ## Roles
//!
//! - **resident**: registers one house, sees the approved map without contact
//!   details, adds meeting notes.
//! - **association**: sees the true status, contact and occupant count.
//! - **admin**: approves, adds, edits and removes houses and members; authors
//!   events and meetings.
//!
//! Members whose account is still pending see nothing until an admin approves it.

pub mod auth;
pub mod cascade;
pub mod community;
pub mod config;
pub mod error;
pub mod live;
pub mod models;
pub mod moderation;
pub mod registry;
pub mod validation;
pub mod visibility;

pub use auth::{AuthState, AuthUser, CurrentUser, IdentityProvider, MemoryIdentity, SessionContext};
pub use cascade::{delete_user_cascade, purge_user_data, CascadeReport};
pub use community::{Community, EventForm, MeetingForm};
pub use config::NeighborhoodConfig;
pub use error::{Error, Result, ValidationError};
pub use live::{Collections, LiveMirror};
pub use moderation::Moderation;
pub use registry::{AdminHouseForm, HouseRegistry, HouseSubmission, HouseUpdate};
pub use visibility::{HouseView, Viewer};
