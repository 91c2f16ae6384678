//! # House record and its identity key
//!
//! A house is a pin on the neighborhood map plus the metadata a resident or an
//! admin attached to it. Resident submissions start [`HouseStatus::Pending`];
//! admin-created houses carry no `userId` and start in whatever status the admin
//! picked.
//!
//! ## Identity
//!
//! Houses have a soft uniqueness rule: one non-apartment house per number, one
//! apartment per (block, number). [`HouseKey`] captures that identity. Its
//! `number_key` is the lower-cased stored number (`"a-12"` for block A, flat 12)
//! and is persisted as `numberKey` so the duplicate check can run as a single
//! equality lookup. Candidates returned by that lookup are then compared with
//! [`HouseKey::collides_with`]. Records stored without a `numberKey` are outside
//! the check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use store::Record;

/// A point on the map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseType {
    #[serde(alias = "villa")]
    SingleVilla,
    Apartment,
    #[serde(alias = "multi-villa")]
    MultiVilla,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HouseStatus {
    /// Awaiting admin approval.
    Pending,
    Occupied,
    /// Occupants temporarily away. Only privileged viewers see this.
    Away,
    VacantRent,
    VacantSale,
}

/// Who lives in an occupied house.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occupancy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_of_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resident_phone: Option<String>,
}

/// Rent or sale details for a vacant house.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_of_building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_rent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Occupant counts are numbers, or numeric strings in records written straight
/// from a form field. A blank string means no count.
fn occupant_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Count(u32),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Count(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// A house, stored at `houses/{id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct House {
    #[serde(flatten)]
    pub location: GeoPoint,
    #[serde(rename = "type")]
    pub house_type: HouseType,
    /// Display number; `block-number` for apartments.
    pub number: String,
    #[serde(default)]
    pub number_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_number: Option<String>,
    #[serde(default)]
    pub owner_name: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default, deserialize_with = "occupant_count")]
    pub occupants: Option<u32>,
    pub status: HouseStatus,
    /// Owning member; absent for admin-created houses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<Occupancy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listing: Option<Listing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for House {
    const COLLECTION: &'static str = "houses";
}

impl House {
    pub fn is_apartment(&self) -> bool {
        self.house_type == HouseType::Apartment
    }

    pub fn is_pending(&self) -> bool {
        self.status == HouseStatus::Pending
    }

    pub fn is_owned_by(&self, uid: &str) -> bool {
        self.user_id.as_deref() == Some(uid)
    }

    /// Lookup key for this house, derived from the number when the stored
    /// `numberKey` is empty.
    ///
    /// The duplicate check finds candidates by equality on the stored
    /// `numberKey`, so records written without one are never candidates.
    pub fn number_key(&self) -> String {
        if self.number_key.is_empty() {
            self.number.trim().to_lowercase()
        } else {
            self.number_key.clone()
        }
    }
}

/// Identity of a house for the duplicate check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HouseKey {
    /// Stored display number: `number`, or `block-number` for apartments.
    pub number: String,
    /// Lower-cased `number`, the equality-lookup field.
    pub number_key: String,
    /// Lower-cased block, present for apartments only.
    pub block: Option<String>,
}

impl HouseKey {
    pub fn new(house_type: HouseType, block: Option<&str>, number: &str) -> Self {
        let number = number.trim();
        match (house_type, block.map(str::trim)) {
            (HouseType::Apartment, Some(block)) => {
                let composite = format!("{}-{}", block, number);
                Self {
                    number_key: composite.to_lowercase(),
                    number: composite,
                    block: Some(block.to_lowercase()),
                }
            }
            _ => Self {
                number: number.to_string(),
                number_key: number.to_lowercase(),
                block: None,
            },
        }
    }

    pub fn is_apartment(&self) -> bool {
        self.block.is_some()
    }

    /// Whether an existing house already holds this identity.
    ///
    /// Apartments only collide with apartments in the same block; every other
    /// type collides with any non-apartment of the same number.
    pub fn collides_with(&self, existing: &House) -> bool {
        if existing.number_key() != self.number_key {
            return false;
        }
        match &self.block {
            Some(block) => {
                existing.is_apartment()
                    && existing
                        .block
                        .as_deref()
                        .is_some_and(|b| b.trim().to_lowercase() == *block)
            }
            None => !existing.is_apartment(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn house(house_type: HouseType, block: Option<&str>, number: &str) -> House {
        let key = HouseKey::new(house_type, block, number);
        House {
            location: GeoPoint::new(12.905, 80.158),
            house_type,
            number: key.number,
            number_key: key.number_key,
            block: block.map(str::to_string),
            apartment_name: None,
            floor_number: None,
            owner_name: "Owner".into(),
            contact: "9876543210".into(),
            occupants: Some(3),
            status: HouseStatus::Pending,
            user_id: Some("u1".into()),
            occupancy: None,
            listing: None,
            created_at: None,
        }
    }

    #[test]
    fn test_occupants_accept_numeric_strings() {
        let mut doc = serde_json::to_value(house(HouseType::SingleVilla, None, "4")).unwrap();
        doc["occupants"] = json!("4");
        let parsed: House = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(parsed.occupants, Some(4));

        doc["occupants"] = json!("");
        let parsed: House = serde_json::from_value(doc.clone()).unwrap();
        assert_eq!(parsed.occupants, None);

        doc["occupants"] = json!("four");
        assert!(serde_json::from_value::<House>(doc).is_err());
    }

    #[test]
    fn test_apartment_key_is_composite() {
        let key = HouseKey::new(HouseType::Apartment, Some(" A "), "12");
        assert_eq!(key.number, "A-12");
        assert_eq!(key.number_key, "a-12");
        assert_eq!(key.block.as_deref(), Some("a"));
    }

    #[test]
    fn test_villa_collides_with_villa_and_multi_villa() {
        let key = HouseKey::new(HouseType::SingleVilla, None, "12");
        assert!(key.collides_with(&house(HouseType::SingleVilla, None, "12")));
        assert!(key.collides_with(&house(HouseType::MultiVilla, None, "12")));
        assert!(!key.collides_with(&house(HouseType::SingleVilla, None, "13")));
    }

    #[test]
    fn test_apartment_does_not_collide_with_villa() {
        let key = HouseKey::new(HouseType::Apartment, Some("A"), "12");
        assert!(!key.collides_with(&house(HouseType::SingleVilla, None, "12")));

        let villa = HouseKey::new(HouseType::SingleVilla, None, "A-12");
        assert!(!villa.collides_with(&house(HouseType::Apartment, Some("A"), "12")));
    }

    #[test]
    fn test_apartment_collision_ignores_case_and_checks_block() {
        let key = HouseKey::new(HouseType::Apartment, Some("a"), "12");
        assert!(key.collides_with(&house(HouseType::Apartment, Some("A"), "12")));

        // Same composite number, different block split
        let other = HouseKey::new(HouseType::Apartment, Some("A-1"), "2");
        assert!(!other.collides_with(&house(HouseType::Apartment, Some("A"), "1-2")));
    }

    #[test]
    fn test_document_shape() {
        let h = house(HouseType::Apartment, Some("B"), "7");
        let fields = h.to_fields().unwrap();
        assert_eq!(fields["type"], json!("apartment"));
        assert_eq!(fields["number"], json!("B-7"));
        assert_eq!(fields["numberKey"], json!("b-7"));
        assert_eq!(fields["userId"], json!("u1"));
        assert_eq!(fields["lat"], json!(12.905));
        assert_eq!(fields["status"], json!("pending"));
    }

    #[test]
    fn test_reads_legacy_type_names() {
        let h: House = serde_json::from_value(json!({
            "lat": 12.9, "lng": 80.1,
            "type": "villa",
            "number": "42",
            "status": "vacant_rent"
        }))
        .unwrap();
        assert_eq!(h.house_type, HouseType::SingleVilla);
        assert_eq!(h.status, HouseStatus::VacantRent);
        assert_eq!(h.number_key(), "42");
        assert!(h.user_id.is_none());

        let multi: HouseType = serde_json::from_value(json!("multi-villa")).unwrap();
        assert_eq!(multi, HouseType::MultiVilla);
    }
}
