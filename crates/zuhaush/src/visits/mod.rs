//! Property visit booking. Time strings are normalized so that equivalent spellings
//! occupy the same slot, and at most one open visit may hold a slot.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{master_time_slots, TimeSlot, Visit, VisitActor, VisitId, VisitStatus};
pub use repository::{VisitFilter, VisitRepository};
pub use router::visit_router;
pub use service::{
    BookedSlots, CancelVisit, RescheduleVisit, ScheduleVisit, ScheduledProperty,
    SlotAvailability, VisitCaller, VisitService, VisitStats, VisitUpdate,
};
