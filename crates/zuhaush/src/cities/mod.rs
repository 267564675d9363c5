//! City directory used by search filters and profile forms.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{City, CityId};
pub use repository::CityRepository;
pub use router::city_router;
pub use service::{CityService, CityUpdate, NewCity};
