use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::admins::AdminId;
use crate::accounts::builders::BuilderId;
use crate::error::ServiceError;
use crate::store::record_id;

record_id!(PropertyId);
record_id!(MediaId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Apartment,
    Villa,
    Plot,
    Commercial,
    Office,
    Shop,
    Warehouse,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    Sqft,
    Sqm,
    Acre,
    Hectare,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub value: f64,
    pub unit: AreaUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    Lakh,
    Crore,
    Rupees,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub value: f64,
    pub unit: PriceUnit,
}

impl Price {
    /// Normalized amount used for range filters and sorting.
    pub fn in_rupees(&self) -> f64 {
        match self.unit {
            PriceUnit::Rupees => self.value,
            PriceUnit::Lakh => self.value * 100_000.0,
            PriceUnit::Crore => self.value * 10_000_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Document,
    FloorPlan,
    Brochure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: MediaId,
    pub kind: MediaKind,
    pub url: String,
    pub key: Option<String>,
    pub caption: Option<String>,
    pub is_primary: bool,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmenityCategory {
    Basic,
    Lifestyle,
    Security,
    Parking,
    Maintenance,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amenity {
    pub category: AmenityCategory,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    Draft,
    Active,
    Sold,
    Rented,
    Inactive,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyFlag {
    Featured,
    NewLaunch,
    Premium,
    BestSeller,
    LimitedOffer,
    Verified,
    Trending,
}

/// Engagement counters kept on the property document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Views,
    Inquiries,
    Likes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub id: PropertyId,
    pub builder_id: BuilderId,
    pub name: String,
    pub property_type: PropertyType,
    pub bhk: Option<String>,
    pub area: Option<Area>,
    pub price: Price,
    pub city: String,
    pub locality: String,
    pub geo: Option<GeoLocation>,
    pub media: Vec<Media>,
    pub amenities: Vec<Amenity>,
    pub status: PropertyStatus,
    pub admin_approved: bool,
    pub approved_by: Option<AdminId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub slug: String,
    pub flags: BTreeSet<PropertyFlag>,
    pub description: Option<String>,
    pub availability: Option<String>,
    pub views: u64,
    pub inquiries: u64,
    pub likes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// Visible in public listings.
    pub fn is_listed(&self) -> bool {
        self.admin_approved && self.status == PropertyStatus::Active
    }

    pub fn counter(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Views => self.views,
            Counter::Inquiries => self.inquiries,
            Counter::Likes => self.likes,
        }
    }

    /// Apply a signed delta, flooring at zero.
    pub fn adjust(&mut self, counter: Counter, delta: i64) -> u64 {
        let slot = match counter {
            Counter::Views => &mut self.views,
            Counter::Inquiries => &mut self.inquiries,
            Counter::Likes => &mut self.likes,
        };
        *slot = if delta.is_negative() {
            slot.saturating_sub(delta.unsigned_abs())
        } else {
            slot.saturating_add(delta as u64)
        };
        *slot
    }

    pub fn primary_media(&self) -> Option<&Media> {
        self.media.iter().find(|media| media.is_primary)
    }
}

/// Canonical form of a bedroom descriptor such as `2 bhk`, `3.5BHK`, `1rk` or `1 studio`.
pub fn normalize_bhk(raw: &str) -> Result<String, ServiceError> {
    let invalid = || ServiceError::validation("BHK must look like 2BHK, 3.5BHK, 1RK or 1Studio");
    let trimmed = raw.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (suffix, canonical) = [("BHK", "BHK"), ("RK", "RK"), ("STUDIO", "Studio")]
        .into_iter()
        .find(|(suffix, _)| upper.ends_with(suffix))
        .ok_or_else(invalid)?;

    let number = trimmed[..trimmed.len() - suffix.len()].trim_end();
    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (number, ""),
    };

    let digits_only = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) {
        return Err(invalid());
    }

    Ok(format!("{number}{canonical}"))
}

/// URL slug derived from a property name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "property".to_string()
    } else {
        slug
    }
}

pub fn validate_geo(geo: &GeoLocation) -> Result<(), ServiceError> {
    if !(-90.0..=90.0).contains(&geo.latitude) {
        return Err(ServiceError::validation("Latitude must be between -90 and 90"));
    }
    if !(-180.0..=180.0).contains(&geo.longitude) {
        return Err(ServiceError::validation(
            "Longitude must be between -180 and 180",
        ));
    }
    Ok(())
}

pub fn validate_amount(field: &str, value: f64) -> Result<(), ServiceError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ServiceError::validation(format!(
            "{field} must be a non-negative number"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bhk_is_normalized() {
        assert_eq!(normalize_bhk("2 bhk").expect("valid"), "2BHK");
        assert_eq!(normalize_bhk("3.5BHK").expect("valid"), "3.5BHK");
        assert_eq!(normalize_bhk(" 1rk ").expect("valid"), "1RK");
        assert_eq!(normalize_bhk("1 STUDIO").expect("valid"), "1Studio");
        for bad in ["BHK", "two BHK", "2 rooms", ".5BHK", "2.a BHK"] {
            assert!(normalize_bhk(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn slug_collapses_separators() {
        assert_eq!(slugify("  Skyline Heights -- Phase II "), "skyline-heights-phase-ii");
        assert_eq!(slugify("###"), "property");
    }

    #[test]
    fn price_converts_to_rupees() {
        let price = Price {
            value: 1.5,
            unit: PriceUnit::Crore,
        };
        assert_eq!(price.in_rupees(), 15_000_000.0);
    }

    #[test]
    fn geo_bounds_are_checked() {
        let mut geo = GeoLocation {
            latitude: 18.52,
            longitude: 73.85,
            address: None,
        };
        assert!(validate_geo(&geo).is_ok());
        geo.latitude = 91.0;
        assert!(validate_geo(&geo).is_err());
        geo.latitude = 0.0;
        geo.longitude = -180.5;
        assert!(validate_geo(&geo).is_err());
    }
}
