//! Records stored in the managed document database.

mod event;
mod house;
mod meeting;
mod user;

pub use event::Event;
pub use house::{GeoPoint, House, HouseKey, HouseStatus, HouseType, Listing, Occupancy};
pub use meeting::{Meeting, Note, MINUTES};
pub use user::{Role, User, UserStatus};
