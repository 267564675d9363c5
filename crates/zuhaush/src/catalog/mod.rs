//! Property catalog: listings owned by builders, their media and flags, admin approval,
//! search and the engagement counters shown on listing cards.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Amenity, AmenityCategory, Area, AreaUnit, Counter, GeoLocation, Media, MediaId, MediaKind,
    Price, PriceUnit, Property, PropertyFlag, PropertyId, PropertyStatus, PropertyType,
};
pub use repository::{PropertyFilter, PropertyRepository};
pub use router::property_router;
pub use service::{
    Editor, MediaInput, MediaUpdate, PropertyInput, PropertyService, PropertyStats,
    PropertyUpdate,
};
