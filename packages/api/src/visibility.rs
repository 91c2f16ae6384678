//! # Role-gated visibility
//!
//! What a caller may see and change is derived from their profile's role and
//! status each time it is asked; no decision is cached. Enforcement proper lives
//! in the backend's declarative rules, this module mirrors them so the
//! application never shows or attempts what the backend would refuse.
//!
//! | Role | Pending houses | "away" status | Contact / occupants | Mutations |
//! |------|----------------|---------------|---------------------|-----------|
//! | admin | all | shown | shown | all |
//! | association | own only | shown | shown | notes only |
//! | resident | own only | shown as "occupied" | hidden | own submission, notes |
//!
//! Members whose own status is still pending see nothing.

use store::Stored;

use crate::error::{Error, Result};
use crate::models::{GeoPoint, House, HouseStatus, HouseType, Role, User, UserStatus};

/// The caller of an operation, as known from their session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub uid: String,
    pub name: String,
    pub role: Role,
    pub status: UserStatus,
}

impl Viewer {
    pub fn from_profile(profile: &User) -> Self {
        Self {
            uid: profile.uid.clone(),
            name: profile.display_name().to_string(),
            role: profile.role,
            status: profile.status,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Pending members get no data and may take no action.
    pub fn require_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(Error::AccountPending)
        }
    }

    pub fn require_admin(&self, action: &str) -> Result<()> {
        self.require_active()?;
        if self.is_admin() {
            Ok(())
        } else {
            Err(Error::PermissionDenied(format!("only admins can {}", action)))
        }
    }
}

/// Status as shown to a viewer with `role`.
pub fn displayed_status(role: Role, status: HouseStatus) -> HouseStatus {
    match status {
        HouseStatus::Away if !role.is_privileged() => HouseStatus::Occupied,
        other => other,
    }
}

/// Whether `viewer` may see `house` on the shared map at all.
pub fn can_see_house(viewer: &Viewer, house: &House) -> bool {
    if !viewer.is_active() {
        return false;
    }
    !house.is_pending() || viewer.is_admin() || house.is_owned_by(&viewer.uid)
}

/// A house as presented to one viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseView {
    pub id: String,
    pub location: GeoPoint,
    pub house_type: HouseType,
    pub number: String,
    pub owner_name: String,
    pub status: HouseStatus,
    /// Present for privileged viewers and the house's own resident.
    pub contact: Option<String>,
    pub occupants: Option<u32>,
    pub is_own: bool,
}

impl HouseView {
    pub fn new(viewer: &Viewer, id: &str, house: &House) -> Self {
        let is_own = house.is_owned_by(&viewer.uid);
        let details = viewer.role.is_privileged() || is_own;
        Self {
            id: id.to_string(),
            location: house.location,
            house_type: house.house_type,
            number: house.number.clone(),
            owner_name: house.owner_name.clone(),
            status: displayed_status(viewer.role, house.status),
            contact: details.then(|| house.contact.clone()),
            occupants: if details { house.occupants } else { None },
            is_own,
        }
    }
}

/// The map as `viewer` sees it.
pub fn visible_houses(viewer: &Viewer, houses: &[Stored<House>]) -> Vec<HouseView> {
    houses
        .iter()
        .filter(|h| can_see_house(viewer, &h.data))
        .map(|h| HouseView::new(viewer, &h.id, &h.data))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HouseKey;

    fn viewer(uid: &str, role: Role) -> Viewer {
        Viewer {
            uid: uid.into(),
            name: uid.into(),
            role,
            status: UserStatus::Active,
        }
    }

    fn house(id: &str, owner: &str, status: HouseStatus) -> Stored<House> {
        let key = HouseKey::new(HouseType::SingleVilla, None, id);
        Stored {
            id: id.into(),
            data: House {
                location: GeoPoint::new(12.905, 80.158),
                house_type: HouseType::SingleVilla,
                number: key.number,
                number_key: key.number_key,
                block: None,
                apartment_name: None,
                floor_number: None,
                owner_name: "Owner".into(),
                contact: "9876543210".into(),
                occupants: Some(4),
                status,
                user_id: Some(owner.into()),
                occupancy: None,
                listing: None,
                created_at: None,
            },
        }
    }

    #[test]
    fn test_away_is_masked_for_residents_only() {
        assert_eq!(
            displayed_status(Role::Resident, HouseStatus::Away),
            HouseStatus::Occupied
        );
        assert_eq!(displayed_status(Role::Admin, HouseStatus::Away), HouseStatus::Away);
        assert_eq!(
            displayed_status(Role::Association, HouseStatus::Away),
            HouseStatus::Away
        );
        assert_eq!(
            displayed_status(Role::Resident, HouseStatus::VacantSale),
            HouseStatus::VacantSale
        );
    }

    #[test]
    fn test_resident_never_observes_away() {
        let houses = vec![
            house("1", "other", HouseStatus::Away),
            house("2", "me", HouseStatus::Away),
            house("3", "other", HouseStatus::Occupied),
        ];
        let seen = visible_houses(&viewer("me", Role::Resident), &houses);
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|h| h.status == HouseStatus::Occupied));
    }

    #[test]
    fn test_pending_houses_hidden_from_other_residents() {
        let houses = vec![
            house("1", "other", HouseStatus::Pending),
            house("2", "me", HouseStatus::Pending),
            house("3", "other", HouseStatus::Occupied),
        ];

        let resident: Vec<_> = visible_houses(&viewer("me", Role::Resident), &houses)
            .into_iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(resident, vec!["2", "3"]);

        let association = visible_houses(&viewer("assoc", Role::Association), &houses);
        assert_eq!(association.len(), 1);

        let admin = visible_houses(&viewer("root", Role::Admin), &houses);
        assert_eq!(admin.len(), 3);
    }

    #[test]
    fn test_contact_details_gated() {
        let houses = vec![house("1", "other", HouseStatus::Occupied)];

        let resident = &visible_houses(&viewer("me", Role::Resident), &houses)[0];
        assert!(resident.contact.is_none());
        assert!(resident.occupants.is_none());

        let association = &visible_houses(&viewer("assoc", Role::Association), &houses)[0];
        assert_eq!(association.contact.as_deref(), Some("9876543210"));
        assert_eq!(association.occupants, Some(4));

        let owner = &visible_houses(&viewer("other", Role::Resident), &houses)[0];
        assert!(owner.is_own);
        assert!(owner.contact.is_some());
    }

    #[test]
    fn test_pending_viewer_sees_nothing() {
        let mut pending = viewer("me", Role::Resident);
        pending.status = UserStatus::Pending;
        let houses = vec![house("1", "other", HouseStatus::Occupied)];
        assert!(visible_houses(&pending, &houses).is_empty());
        assert!(matches!(pending.require_active(), Err(Error::AccountPending)));
    }

    #[test]
    fn test_require_admin() {
        assert!(viewer("root", Role::Admin).require_admin("approve houses").is_ok());
        let err = viewer("assoc", Role::Association)
            .require_admin("approve houses")
            .unwrap_err();
        assert_eq!(err.to_string(), "Permission denied: only admins can approve houses");
    }
}
