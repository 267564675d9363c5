use chrono::NaiveDate;
use serde::Deserialize;

use super::domain::{TimeSlot, Visit, VisitId, VisitStatus};
use crate::accounts::users::UserId;
use crate::catalog::PropertyId;
use crate::store::RepositoryError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisitFilter {
    pub user_id: Option<UserId>,
    pub property_id: Option<PropertyId>,
    pub status: Option<VisitStatus>,
    pub date: Option<NaiveDate>,
}

impl VisitFilter {
    pub fn matches(&self, visit: &Visit) -> bool {
        self.user_id.as_ref().map_or(true, |user| &visit.user_id == user)
            && self
                .property_id
                .as_ref()
                .map_or(true, |property| &visit.property_id == property)
            && self.status.map_or(true, |status| visit.status == status)
            && self.date.map_or(true, |date| visit.date == date)
    }
}

/// Storage abstraction for visits.
///
/// `insert` and `update` must refuse, atomically with the write, any record whose
/// status holds a slot already held by another visit (`RepositoryError::Conflict`).
pub trait VisitRepository: Send + Sync {
    fn insert(&self, visit: Visit) -> Result<Visit, RepositoryError>;
    fn update(&self, visit: Visit) -> Result<Visit, RepositoryError>;
    fn fetch(&self, id: &VisitId) -> Result<Option<Visit>, RepositoryError>;
    fn list(&self, filter: &VisitFilter) -> Result<Vec<Visit>, RepositoryError>;
    fn delete(&self, id: &VisitId) -> Result<bool, RepositoryError>;
    /// Active visit holding the slot, ignoring `exclude`.
    fn slot_holder(
        &self,
        property: &PropertyId,
        date: NaiveDate,
        time: TimeSlot,
        exclude: Option<&VisitId>,
    ) -> Result<Option<Visit>, RepositoryError>;
}
