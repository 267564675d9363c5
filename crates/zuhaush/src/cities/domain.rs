use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::record_id;

record_id!(CityId);

pub const DEFAULT_COUNTRY: &str = "India";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub state: String,
    pub country: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl City {
    /// Key used for the case-insensitive name uniqueness rule.
    pub fn name_key(name: &str) -> String {
        name.trim().to_lowercase()
    }
}
