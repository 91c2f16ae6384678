//! # House registration
//!
//! [`HouseRegistry`] owns every write to the `houses` collection:
//!
//! | Operation | Caller | Result |
//! |-----------|--------|--------|
//! | [`submit`](HouseRegistry::submit) | any active member | new house, status `pending`, owned by the caller |
//! | [`admin_add`](HouseRegistry::admin_add) | admin | new house in the chosen status, no owner |
//! | [`edit`](HouseRegistry::edit) | admin | number / owner / occupants / contact / status changed |
//! | [`update_status`](HouseRegistry::update_status) | admin | status changed |
//! | [`delete`](HouseRegistry::delete) | admin | house removed |
//!
//! Every path that creates or renumbers a house runs the duplicate check first:
//! one equality lookup on `numberKey`, then [`HouseKey::collides_with`] on the
//! candidates. The lookup and the write are separate calls with nothing held in
//! between, so two members submitting the same number at the same moment can
//! both succeed.

use chrono::Utc;
use serde_json::json;
use store::{DocumentStore, Fields, Repository, Stored};

use crate::config::NeighborhoodConfig;
use crate::error::{Error, Result, ValidationError};
use crate::models::{GeoPoint, House, HouseKey, HouseStatus, HouseType, Listing, Occupancy};
use crate::validation::{is_valid_name, is_valid_phone};
use crate::visibility::Viewer;

fn back_to_pending() -> Error {
    Error::InvalidState("A house cannot be moved back to pending.".to_string())
}

/// A resident's "register my house" form.
#[derive(Debug, Clone)]
pub struct HouseSubmission {
    pub house_type: HouseType,
    /// Required for apartments, ignored otherwise.
    pub block: Option<String>,
    pub number: String,
    pub owner_name: String,
    pub occupants: Option<u32>,
    pub contact: String,
    /// Pin dropped on the map.
    pub location: Option<GeoPoint>,
}

/// Check the fields shared by both creation forms, in the order the form
/// reports them.
fn check_identity(
    house_type: HouseType,
    block: Option<&str>,
    number: &str,
    location: Option<GeoPoint>,
    config: &NeighborhoodConfig,
) -> std::result::Result<GeoPoint, ValidationError> {
    if number.trim().is_empty() {
        return Err(ValidationError::HouseNumber);
    }
    if house_type == HouseType::Apartment && block.map_or(true, |b| b.trim().is_empty()) {
        return Err(ValidationError::Block);
    }
    let location = location.ok_or(ValidationError::MissingLocation)?;
    if !config.map.bounds.contains(location) {
        return Err(ValidationError::OutOfBounds);
    }
    Ok(location)
}

impl HouseSubmission {
    /// Validate the form and return the chosen location.
    pub fn validate(
        &self,
        config: &NeighborhoodConfig,
    ) -> std::result::Result<GeoPoint, ValidationError> {
        if !is_valid_name(&self.owner_name) {
            return Err(ValidationError::OwnerName);
        }
        if !is_valid_phone(&self.contact) {
            return Err(ValidationError::Phone);
        }
        check_identity(
            self.house_type,
            self.block.as_deref(),
            &self.number,
            self.location,
            config,
        )
    }

    pub fn key(&self) -> HouseKey {
        HouseKey::new(self.house_type, self.block.as_deref(), &self.number)
    }
}

/// The admin "add house" form, with type- and status-specific details.
#[derive(Debug, Clone)]
pub struct AdminHouseForm {
    pub house_type: HouseType,
    /// One of occupied, vacant_rent or vacant_sale.
    pub status: HouseStatus,
    pub block: Option<String>,
    pub number: String,
    pub apartment_name: Option<String>,
    pub floor_number: Option<String>,
    pub owner_name: String,
    pub contact: String,
    pub occupants: Option<u32>,
    pub location: Option<GeoPoint>,
    pub occupancy: Option<Occupancy>,
    pub listing: Option<Listing>,
}

impl AdminHouseForm {
    pub fn validate(
        &self,
        config: &NeighborhoodConfig,
    ) -> std::result::Result<GeoPoint, ValidationError> {
        // Owner and contact are optional here but must be well formed when given.
        if !self.owner_name.trim().is_empty() && !is_valid_name(&self.owner_name) {
            return Err(ValidationError::OwnerName);
        }
        if !self.contact.trim().is_empty() && !is_valid_phone(self.contact.trim()) {
            return Err(ValidationError::Phone);
        }
        let location = check_identity(
            self.house_type,
            self.block.as_deref(),
            &self.number,
            self.location,
            config,
        )?;
        if !matches!(
            self.status,
            HouseStatus::Occupied | HouseStatus::VacantRent | HouseStatus::VacantSale
        ) {
            return Err(ValidationError::InitialStatus);
        }
        Ok(location)
    }

    pub fn key(&self) -> HouseKey {
        HouseKey::new(self.house_type, self.block.as_deref(), &self.number)
    }
}

/// Fields an admin may change on an existing house. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct HouseUpdate {
    /// New number; for apartments, the unit number within the existing block.
    pub number: Option<String>,
    pub owner_name: Option<String>,
    pub occupants: Option<u32>,
    pub contact: Option<String>,
    pub status: Option<HouseStatus>,
}

/// Reads and writes houses for one neighborhood.
#[derive(Clone, Debug)]
pub struct HouseRegistry<S> {
    repo: Repository<S>,
    config: NeighborhoodConfig,
}

impl<S: DocumentStore> HouseRegistry<S> {
    pub fn new(repo: Repository<S>, config: NeighborhoodConfig) -> Self {
        Self { repo, config }
    }

    pub fn config(&self) -> &NeighborhoodConfig {
        &self.config
    }

    /// An existing house holding `key`, other than `exclude`.
    pub async fn find_duplicate(
        &self,
        key: &HouseKey,
        exclude: Option<&str>,
    ) -> Result<Option<Stored<House>>> {
        let candidates = self
            .repo
            .find_by::<House>("numberKey", key.number_key.as_str())
            .await
            .map_err(Error::failed("save house"))?;
        Ok(candidates
            .into_iter()
            .filter(|h| Some(h.id.as_str()) != exclude)
            .find(|h| key.collides_with(&h.data)))
    }

    /// Fail with the number as the user typed it when `key` is taken.
    async fn ensure_unique(
        &self,
        key: &HouseKey,
        entered: &str,
        exclude: Option<&str>,
    ) -> Result<()> {
        if let Some(existing) = self.find_duplicate(key, exclude).await? {
            tracing::info!(number = %key.number, existing = %existing.id, "duplicate house rejected");
            return Err(Error::DuplicateHouse(entered.trim().to_string()));
        }
        Ok(())
    }

    /// Houses owned by `uid`.
    pub async fn houses_of(&self, uid: &str) -> Result<Vec<Stored<House>>> {
        Ok(self.repo.find_by::<House>("userId", uid).await?)
    }

    /// Register the caller's house. It stays pending until an admin approves it.
    pub async fn submit(
        &self,
        viewer: &Viewer,
        submission: HouseSubmission,
    ) -> Result<Stored<House>> {
        viewer.require_active()?;
        let location = submission.validate(&self.config)?;

        if !self.houses_of(&viewer.uid).await?.is_empty() {
            return Err(Error::HouseAlreadyRegistered);
        }
        let key = submission.key();
        self.ensure_unique(&key, &submission.number, None).await?;

        let house = House {
            location,
            house_type: submission.house_type,
            number: key.number,
            number_key: key.number_key,
            block: key.block.and(submission.block.map(|b| b.trim().to_string())),
            apartment_name: None,
            floor_number: None,
            owner_name: submission.owner_name.trim().to_string(),
            contact: submission.contact,
            occupants: submission.occupants,
            status: HouseStatus::Pending,
            user_id: Some(viewer.uid.clone()),
            occupancy: None,
            listing: None,
            created_at: Some(Utc::now()),
        };
        let id = self
            .repo
            .add(&house)
            .await
            .map_err(Error::failed("save house"))?;
        tracing::info!(%id, uid = %viewer.uid, number = %house.number, "house submitted for approval");
        Ok(Stored { id, data: house })
    }

    /// Add a house directly, bypassing approval.
    pub async fn admin_add(&self, viewer: &Viewer, form: AdminHouseForm) -> Result<Stored<House>> {
        viewer.require_admin("add houses")?;
        let location = form.validate(&self.config)?;
        let key = form.key();
        self.ensure_unique(&key, &form.number, None).await?;

        let is_apartment = form.house_type == HouseType::Apartment;
        let trimmed = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        let house = House {
            location,
            house_type: form.house_type,
            number: key.number,
            number_key: key.number_key,
            block: key.block.and(trimmed(form.block)),
            apartment_name: trimmed(form.apartment_name).filter(|_| is_apartment),
            floor_number: trimmed(form.floor_number).filter(|_| is_apartment),
            owner_name: form.owner_name.trim().to_string(),
            contact: form.contact.trim().to_string(),
            occupants: form.occupants,
            occupancy: form.occupancy.filter(|_| form.status == HouseStatus::Occupied),
            listing: form.listing.filter(|_| form.status != HouseStatus::Occupied),
            status: form.status,
            user_id: None,
            created_at: Some(Utc::now()),
        };
        let id = self
            .repo
            .add(&house)
            .await
            .map_err(Error::failed("save house"))?;
        tracing::info!(%id, number = %house.number, status = ?house.status, "house added by admin");
        Ok(Stored { id, data: house })
    }

    /// Apply an admin's edits. Renumbering runs the duplicate check against
    /// every other house.
    pub async fn edit(&self, viewer: &Viewer, id: &str, update: HouseUpdate) -> Result<House> {
        viewer.require_admin("edit houses")?;
        let existing = self.fetch(id).await?;
        let mut house = existing.data;
        let mut patch = Fields::new();

        if let Some(number) = update.number {
            if number.trim().is_empty() {
                return Err(ValidationError::HouseNumber.into());
            }
            let key = HouseKey::new(house.house_type, house.block.as_deref(), &number);
            if key.number_key != house.number_key() {
                self.ensure_unique(&key, &number, Some(id)).await?;
            }
            patch.insert("number".into(), json!(key.number));
            patch.insert("numberKey".into(), json!(key.number_key));
            house.number = key.number;
            house.number_key = key.number_key;
        }
        if let Some(owner) = update.owner_name {
            if !is_valid_name(&owner) {
                return Err(ValidationError::OwnerName.into());
            }
            patch.insert("ownerName".into(), json!(owner));
            house.owner_name = owner;
        }
        if let Some(contact) = update.contact {
            if !is_valid_phone(&contact) {
                return Err(ValidationError::Phone.into());
            }
            patch.insert("contact".into(), json!(contact));
            house.contact = contact;
        }
        if let Some(occupants) = update.occupants {
            patch.insert("occupants".into(), json!(occupants));
            house.occupants = Some(occupants);
        }
        if let Some(status) = update.status {
            if status == HouseStatus::Pending {
                return Err(back_to_pending());
            }
            patch.insert("status".into(), json!(status));
            house.status = status;
        }

        if patch.is_empty() {
            return Ok(house);
        }
        self.repo
            .update::<House>(id, patch)
            .await
            .map_err(Error::failed("update house"))?;
        tracing::info!(%id, "house edited");
        Ok(house)
    }

    /// Set a house's status. Moving a house back to pending is not allowed.
    pub async fn update_status(
        &self,
        viewer: &Viewer,
        id: &str,
        status: HouseStatus,
    ) -> Result<()> {
        viewer.require_admin("change house status")?;
        if status == HouseStatus::Pending {
            return Err(back_to_pending());
        }
        self.fetch(id).await?;

        let mut patch = Fields::new();
        patch.insert("status".into(), json!(status));
        self.repo
            .update::<House>(id, patch)
            .await
            .map_err(Error::failed("update house"))?;
        tracing::info!(%id, ?status, "house status changed");
        Ok(())
    }

    pub async fn delete(&self, viewer: &Viewer, id: &str) -> Result<()> {
        viewer.require_admin("delete houses")?;
        self.repo
            .delete::<House>(id)
            .await
            .map_err(Error::failed("delete house"))?;
        tracing::info!(%id, "house deleted");
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Stored<House>> {
        self.repo
            .get::<House>(id)
            .await?
            .ok_or_else(|| Error::not_found("House", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, UserStatus};
    use store::MemoryStore;

    fn viewer(uid: &str, role: Role) -> Viewer {
        Viewer {
            uid: uid.into(),
            name: uid.into(),
            role,
            status: UserStatus::Active,
        }
    }

    fn inside() -> GeoPoint {
        GeoPoint::new(12.905, 80.158)
    }

    fn submission(house_type: HouseType, block: Option<&str>, number: &str) -> HouseSubmission {
        HouseSubmission {
            house_type,
            block: block.map(String::from),
            number: number.into(),
            owner_name: "Asha Rao".into(),
            occupants: Some(4),
            contact: "9876543210".into(),
            location: Some(inside()),
        }
    }

    fn admin_form(house_type: HouseType, number: &str, status: HouseStatus) -> AdminHouseForm {
        AdminHouseForm {
            house_type,
            status,
            block: None,
            number: number.into(),
            apartment_name: None,
            floor_number: None,
            owner_name: String::new(),
            contact: String::new(),
            occupants: None,
            location: Some(inside()),
            occupancy: None,
            listing: None,
        }
    }

    fn registry() -> HouseRegistry<MemoryStore> {
        HouseRegistry::new(Repository::new(MemoryStore::new()), NeighborhoodConfig::default())
    }

    #[test]
    fn test_validation_order() {
        let config = NeighborhoodConfig::default();
        let mut form = submission(HouseType::Apartment, None, "");
        form.owner_name = "Asha 2".into();
        form.contact = "12345".into();
        assert_eq!(form.validate(&config), Err(ValidationError::OwnerName));

        form.owner_name = "Asha".into();
        assert_eq!(form.validate(&config), Err(ValidationError::Phone));

        form.contact = "9876543210".into();
        assert_eq!(form.validate(&config), Err(ValidationError::HouseNumber));

        form.number = "12".into();
        assert_eq!(form.validate(&config), Err(ValidationError::Block));

        form.block = Some("A".into());
        form.location = None;
        assert_eq!(form.validate(&config), Err(ValidationError::MissingLocation));

        form.location = Some(GeoPoint::new(13.0, 80.2));
        assert_eq!(form.validate(&config), Err(ValidationError::OutOfBounds));

        form.location = Some(inside());
        assert_eq!(form.validate(&config), Ok(inside()));
    }

    #[tokio::test]
    async fn test_submit_creates_pending_house() {
        let registry = registry();
        let asha = viewer("asha", Role::Resident);

        let house = registry
            .submit(&asha, submission(HouseType::SingleVilla, None, "12"))
            .await
            .unwrap();
        assert_eq!(house.status, HouseStatus::Pending);
        assert_eq!(house.user_id.as_deref(), Some("asha"));
        assert_eq!(house.number_key, "12");
        assert_eq!(registry.houses_of("asha").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_villa_number_collides_with_villa() {
        let registry = registry();
        registry
            .submit(&viewer("asha", Role::Resident), submission(HouseType::SingleVilla, None, "12"))
            .await
            .unwrap();

        let err = registry
            .submit(&viewer("ravi", Role::Resident), submission(HouseType::MultiVilla, None, "12"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "House 12 is already registered.");
    }

    #[tokio::test]
    async fn test_apartment_does_not_collide_with_villa() {
        let registry = registry();
        registry
            .submit(&viewer("asha", Role::Resident), submission(HouseType::SingleVilla, None, "12"))
            .await
            .unwrap();

        let flat = registry
            .submit(
                &viewer("ravi", Role::Resident),
                submission(HouseType::Apartment, Some("A"), "12"),
            )
            .await
            .unwrap();
        assert_eq!(flat.number, "A-12");
        assert_eq!(flat.block.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_apartment_blocks_compare_case_insensitively() {
        let registry = registry();
        registry
            .submit(
                &viewer("asha", Role::Resident),
                submission(HouseType::Apartment, Some("A"), "12"),
            )
            .await
            .unwrap();

        let err = registry
            .submit(
                &viewer("ravi", Role::Resident),
                submission(HouseType::Apartment, Some("a"), "12"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateHouse(_)));

        registry
            .submit(
                &viewer("meena", Role::Resident),
                submission(HouseType::Apartment, Some("B"), "12"),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_resident_holds_one_house() {
        let registry = registry();
        let asha = viewer("asha", Role::Resident);
        registry
            .submit(&asha, submission(HouseType::SingleVilla, None, "1"))
            .await
            .unwrap();
        let err = registry
            .submit(&asha, submission(HouseType::SingleVilla, None, "2"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::HouseAlreadyRegistered));
    }

    #[tokio::test]
    async fn test_pending_member_cannot_submit() {
        let registry = registry();
        let mut pending = viewer("asha", Role::Resident);
        pending.status = UserStatus::Pending;
        let err = registry
            .submit(&pending, submission(HouseType::SingleVilla, None, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AccountPending));
    }

    #[tokio::test]
    async fn test_admin_add_keeps_status_specific_details() {
        let registry = registry();
        let admin = viewer("root", Role::Admin);

        let mut form = admin_form(HouseType::SingleVilla, "7", HouseStatus::VacantRent);
        form.listing = Some(Listing {
            monthly_rent: Some("25000".into()),
            ..Listing::default()
        });
        form.occupancy = Some(Occupancy {
            head_of_family: Some("Nobody".into()),
            resident_phone: None,
        });
        let house = registry.admin_add(&admin, form).await.unwrap();
        assert_eq!(house.status, HouseStatus::VacantRent);
        assert!(house.user_id.is_none());
        assert!(house.occupancy.is_none());
        assert_eq!(
            house.listing.as_ref().and_then(|l| l.monthly_rent.as_deref()),
            Some("25000")
        );

        let dup = admin_form(HouseType::SingleVilla, "7", HouseStatus::Occupied);
        assert!(matches!(
            registry.admin_add(&admin, dup).await,
            Err(Error::DuplicateHouse(_))
        ));

        let pending = admin_form(HouseType::SingleVilla, "8", HouseStatus::Pending);
        assert!(matches!(
            registry.admin_add(&admin, pending).await,
            Err(Error::Validation(ValidationError::InitialStatus))
        ));
    }

    #[tokio::test]
    async fn test_admin_only_mutations() {
        let registry = registry();
        let asha = viewer("asha", Role::Resident);
        let association = viewer("assoc", Role::Association);
        let house = registry
            .submit(&asha, submission(HouseType::SingleVilla, None, "3"))
            .await
            .unwrap();

        for who in [&asha, &association] {
            assert!(matches!(
                registry.update_status(who, &house.id, HouseStatus::Away).await,
                Err(Error::PermissionDenied(_))
            ));
            assert!(matches!(
                registry.delete(who, &house.id).await,
                Err(Error::PermissionDenied(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_edit_renumber_checks_duplicates() {
        let registry = registry();
        let admin = viewer("root", Role::Admin);
        registry
            .admin_add(&admin, admin_form(HouseType::SingleVilla, "20", HouseStatus::Occupied))
            .await
            .unwrap();
        let other = registry
            .admin_add(&admin, admin_form(HouseType::SingleVilla, "21", HouseStatus::Occupied))
            .await
            .unwrap();

        let clash = HouseUpdate {
            number: Some("20".into()),
            ..HouseUpdate::default()
        };
        assert!(matches!(
            registry.edit(&admin, &other.id, clash).await,
            Err(Error::DuplicateHouse(_))
        ));

        let update = HouseUpdate {
            number: Some("21B".into()),
            owner_name: Some("Kiran".into()),
            status: Some(HouseStatus::Away),
            ..HouseUpdate::default()
        };
        let edited = registry.edit(&admin, &other.id, update).await.unwrap();
        assert_eq!(edited.number_key, "21b");
        assert_eq!(edited.status, HouseStatus::Away);

        // Keeping the same number is not a clash with itself
        let same = HouseUpdate {
            number: Some("21b".into()),
            ..HouseUpdate::default()
        };
        registry.edit(&admin, &other.id, same).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_status_and_delete() {
        let registry = registry();
        let admin = viewer("root", Role::Admin);
        let house = registry
            .admin_add(&admin, admin_form(HouseType::SingleVilla, "5", HouseStatus::Occupied))
            .await
            .unwrap();

        registry
            .update_status(&admin, &house.id, HouseStatus::VacantSale)
            .await
            .unwrap();
        assert!(matches!(
            registry.update_status(&admin, &house.id, HouseStatus::Pending).await,
            Err(Error::InvalidState(_))
        ));

        registry.delete(&admin, &house.id).await.unwrap();
        assert!(matches!(
            registry.update_status(&admin, &house.id, HouseStatus::Occupied).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_edit_cannot_return_house_to_pending() {
        let registry = registry();
        let admin = viewer("root", Role::Admin);
        let house = registry
            .admin_add(&admin, admin_form(HouseType::SingleVilla, "5", HouseStatus::Occupied))
            .await
            .unwrap();

        let update = HouseUpdate {
            owner_name: Some("Kiran".into()),
            status: Some(HouseStatus::Pending),
            ..HouseUpdate::default()
        };
        assert!(matches!(
            registry.edit(&admin, &house.id, update).await,
            Err(Error::InvalidState(_))
        ));

        // Nothing was written
        let houses = registry.repo.list::<House>().await.unwrap();
        assert_eq!(houses[0].status, HouseStatus::Occupied);
        assert_eq!(houses[0].owner_name, "");
    }

    #[tokio::test]
    async fn test_duplicate_message_uses_entered_number() {
        let registry = registry();
        registry
            .submit(
                &viewer("asha", Role::Resident),
                submission(HouseType::Apartment, Some("A"), "12"),
            )
            .await
            .unwrap();

        let err = registry
            .submit(
                &viewer("ravi", Role::Resident),
                submission(HouseType::Apartment, Some("a"), " 12 "),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "House 12 is already registered.");
    }

    #[tokio::test]
    async fn test_records_without_number_key_are_outside_the_check() {
        let registry = registry();
        let key = HouseKey::new(HouseType::SingleVilla, None, "30");
        let mut legacy = House {
            location: inside(),
            house_type: HouseType::SingleVilla,
            number: key.number.clone(),
            number_key: String::new(),
            block: None,
            apartment_name: None,
            floor_number: None,
            owner_name: "Old".into(),
            contact: String::new(),
            occupants: None,
            status: HouseStatus::Occupied,
            user_id: None,
            occupancy: None,
            listing: None,
            created_at: None,
        };
        registry.repo.add(&legacy).await.unwrap();

        assert!(registry.find_duplicate(&key, None).await.unwrap().is_none());
        legacy.number_key = key.number_key.clone();
        assert!(key.collides_with(&legacy));
    }
}
