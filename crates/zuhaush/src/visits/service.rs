use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{master_time_slots, TimeSlot, Visit, VisitActor, VisitId, VisitStatus};
use super::repository::{VisitFilter, VisitRepository};
use crate::accounts::admins::AdminId;
use crate::accounts::builders::BuilderId;
use crate::accounts::users::UserId;
use crate::catalog::{Property, PropertyId, PropertyRepository};
use crate::error::ServiceError;
use crate::notifications::{
    NewNotification, NotificationService, NotificationType, Priority, Recipient, SenderKind,
};
use crate::pagination::{Page, PageRequest};
use crate::store::RepositoryError;
use crate::validation::optional_text;

const VISIT_SORT_FIELDS: &[&str] = &["date", "created_at", "status"];

/// Who is acting on a visit.
#[derive(Debug, Clone, Copy)]
pub enum VisitCaller<'a> {
    User(&'a UserId),
    Builder(&'a BuilderId),
    Admin(&'a AdminId),
}

impl VisitCaller<'_> {
    fn actor(&self) -> VisitActor {
        match self {
            Self::User(id) => VisitActor::User(id.to_string()),
            Self::Builder(id) => VisitActor::Builder(id.to_string()),
            Self::Admin(id) => VisitActor::Admin(id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleVisit {
    pub property_id: PropertyId,
    pub date: NaiveDate,
    pub time: TimeSlot,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisitUpdate {
    pub date: Option<NaiveDate>,
    pub time: Option<TimeSlot>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleVisit {
    pub date: NaiveDate,
    pub time: TimeSlot,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelVisit {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    pub property_id: PropertyId,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookedSlots {
    pub property_id: PropertyId,
    pub date: NaiveDate,
    pub booked: Vec<TimeSlot>,
    pub available: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VisitStats {
    pub total: u64,
    pub by_status: BTreeMap<VisitStatus, u64>,
}

/// A property the user has an open visit for, with that visit.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledProperty {
    pub property: Property,
    pub visit: Visit,
}

fn visit_not_found() -> ServiceError {
    ServiceError::not_found("Visit not found")
}

fn slot_taken() -> ServiceError {
    ServiceError::conflict("Time slot is not available")
}

fn slot_conflict(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict(_) => slot_taken(),
        other => other.into(),
    }
}

fn ensure_not_past(date: NaiveDate) -> Result<(), ServiceError> {
    if date < Utc::now().date_naive() {
        return Err(ServiceError::validation("Visit date cannot be in the past"));
    }
    Ok(())
}

fn sort_visits(items: &mut [Visit], page: &PageRequest) -> Result<(), ServiceError> {
    match &page.sort {
        Some(sort) => sort.apply(items, VISIT_SORT_FIELDS, |field, a: &Visit, b: &Visit| match field {
            "date" => Some(a.starts_at().cmp(&b.starts_at())),
            "created_at" => Some(a.created_at.cmp(&b.created_at)),
            "status" => Some(a.status.cmp(&b.status)),
            _ => None,
        }),
        None => {
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(())
        }
    }
}

/// Property visit booking with one active visit per (property, date, time).
pub struct VisitService {
    visits: Arc<dyn VisitRepository>,
    properties: Arc<dyn PropertyRepository>,
    notifications: Arc<NotificationService>,
}

impl VisitService {
    pub fn new(
        visits: Arc<dyn VisitRepository>,
        properties: Arc<dyn PropertyRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            visits,
            properties,
            notifications,
        }
    }

    fn property(&self, id: &PropertyId) -> Result<Property, ServiceError> {
        self.properties
            .fetch(id)?
            .ok_or_else(|| ServiceError::not_found("Property not found"))
    }

    fn load(&self, id: &VisitId) -> Result<Visit, ServiceError> {
        self.visits.fetch(id)?.ok_or_else(visit_not_found)
    }

    /// Load a visit the caller may see: its user, the property's builder, or any admin.
    fn authorized(&self, caller: VisitCaller<'_>, id: &VisitId) -> Result<(Visit, Property), ServiceError> {
        let visit = self.load(id)?;
        let property = self.property(&visit.property_id)?;
        let allowed = match caller {
            VisitCaller::User(user) => &visit.user_id == user,
            VisitCaller::Builder(builder) => &property.builder_id == builder,
            VisitCaller::Admin(_) => true,
        };
        if !allowed {
            return Err(ServiceError::forbidden("You can only access your own visits"));
        }
        Ok((visit, property))
    }

    fn is_free(
        &self,
        property: &PropertyId,
        date: NaiveDate,
        time: TimeSlot,
        exclude: Option<&VisitId>,
    ) -> Result<bool, ServiceError> {
        Ok(self.visits.slot_holder(property, date, time, exclude)?.is_none())
    }

    fn notify_user(&self, visit: &Visit, kind: NotificationType, title: &str, description: String) {
        self.notifications.notify_quietly(
            NewNotification::system(Recipient::user(&visit.user_id), kind, title, description)
                .with_action(format!("/visits/{}", visit.id)),
        );
    }

    fn notify_builder(
        &self,
        property: &Property,
        visit: &Visit,
        kind: NotificationType,
        title: &str,
        description: String,
    ) {
        self.notifications.notify_quietly(
            NewNotification::system(Recipient::builder(&property.builder_id), kind, title, description)
                .from_sender(SenderKind::User, visit.user_id.as_str())
                .with_action(format!("/visits/{}", visit.id)),
        );
    }

    pub fn schedule(&self, user: &UserId, input: ScheduleVisit) -> Result<Visit, ServiceError> {
        let property = self.property(&input.property_id)?;
        if !property.is_listed() {
            return Err(ServiceError::not_found("Property not found"));
        }
        ensure_not_past(input.date)?;
        if !self.is_free(&property.id, input.date, input.time, None)? {
            return Err(slot_taken());
        }

        let now = Utc::now();
        let visit = Visit {
            id: VisitId::generate(),
            user_id: user.clone(),
            property_id: property.id.clone(),
            date: input.date,
            time: input.time,
            status: VisitStatus::Scheduled,
            notes: optional_text("Notes", input.notes.as_deref(), 500)?,
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
            rescheduled_at: None,
            rescheduled_by: None,
            created_at: now,
            updated_at: now,
        };
        let visit = self.visits.insert(visit).map_err(slot_conflict)?;
        info!(visit = %visit.id, property = %property.id, "visit scheduled");

        let when = format!("{} at {}", visit.date, visit.time);
        self.notify_builder(
            &property,
            &visit,
            NotificationType::VisitRequest,
            "New visit request",
            format!("A visit to {} was requested for {when}.", property.name),
        );
        self.notify_user(
            &visit,
            NotificationType::VisitScheduled,
            "Visit scheduled",
            format!("Your visit to {} is scheduled for {when}.", property.name),
        );
        Ok(visit)
    }

    pub fn get(&self, caller: VisitCaller<'_>, id: &VisitId) -> Result<Visit, ServiceError> {
        self.authorized(caller, id).map(|(visit, _)| visit)
    }

    pub fn list(&self, filter: &VisitFilter, page: &PageRequest) -> Result<Page<Visit>, ServiceError> {
        let mut items = self.visits.list(filter)?;
        sort_visits(&mut items, page)?;
        Ok(Page::paginate(items, page))
    }

    pub fn for_user(
        &self,
        user: &UserId,
        filter: &VisitFilter,
        page: &PageRequest,
    ) -> Result<Page<Visit>, ServiceError> {
        let filter = VisitFilter {
            user_id: Some(user.clone()),
            ..filter.clone()
        };
        self.list(&filter, page)
    }

    /// Visits on any of the builder's properties.
    pub fn for_builder(
        &self,
        builder: &BuilderId,
        filter: &VisitFilter,
        page: &PageRequest,
    ) -> Result<Page<Visit>, ServiceError> {
        let mut items = Vec::new();
        for visit in self.visits.list(filter)? {
            let owned = self
                .properties
                .fetch(&visit.property_id)?
                .is_some_and(|property| &property.builder_id == builder);
            if owned {
                items.push(visit);
            }
        }
        sort_visits(&mut items, page)?;
        Ok(Page::paginate(items, page))
    }

    pub fn update(
        &self,
        caller: VisitCaller<'_>,
        id: &VisitId,
        update: VisitUpdate,
    ) -> Result<Visit, ServiceError> {
        if matches!(caller, VisitCaller::Builder(_)) {
            return Err(ServiceError::forbidden("Builders cannot edit visits"));
        }
        let (mut visit, _) = self.authorized(caller, id)?;
        if visit.status.is_closed() {
            return Err(ServiceError::validation("Visit can no longer be changed"));
        }

        let date = update.date.unwrap_or(visit.date);
        let time = update.time.unwrap_or(visit.time);
        if date != visit.date || time != visit.time {
            ensure_not_past(date)?;
            if !self.is_free(&visit.property_id, date, time, Some(&visit.id))? {
                return Err(slot_taken());
            }
            visit.date = date;
            visit.time = time;
        }
        if let Some(notes) = update.notes {
            visit.notes = optional_text("Notes", Some(&notes), 500)?;
        }
        visit.updated_at = Utc::now();
        self.visits.update(visit).map_err(slot_conflict)
    }

    pub fn delete(&self, caller: VisitCaller<'_>, id: &VisitId) -> Result<(), ServiceError> {
        if matches!(caller, VisitCaller::Builder(_)) {
            return Err(ServiceError::forbidden("Builders cannot delete visits"));
        }
        let (visit, _) = self.authorized(caller, id)?;
        self.visits.delete(&visit.id)?;
        info!(visit = %visit.id, "visit deleted");
        Ok(())
    }

    pub fn confirm(&self, caller: VisitCaller<'_>, id: &VisitId) -> Result<Visit, ServiceError> {
        if matches!(caller, VisitCaller::User(_)) {
            return Err(ServiceError::forbidden("Only the builder can confirm a visit"));
        }
        let (mut visit, property) = self.authorized(caller, id)?;
        if visit.status != VisitStatus::Scheduled {
            return Err(ServiceError::validation("Only scheduled visits can be confirmed"));
        }
        visit.status = VisitStatus::Confirmed;
        visit.updated_at = Utc::now();
        let visit = self.visits.update(visit).map_err(slot_conflict)?;

        self.notify_user(
            &visit,
            NotificationType::VisitConfirmed,
            "Visit confirmed",
            format!(
                "Your visit to {} on {} at {} is confirmed.",
                property.name, visit.date, visit.time
            ),
        );
        Ok(visit)
    }

    pub fn cancel(
        &self,
        caller: VisitCaller<'_>,
        id: &VisitId,
        request: CancelVisit,
    ) -> Result<Visit, ServiceError> {
        let (mut visit, property) = self.authorized(caller, id)?;
        if visit.status.is_closed() {
            return Err(ServiceError::validation("Visit cannot be cancelled"));
        }
        let now = Utc::now();
        visit.status = VisitStatus::Cancelled;
        visit.cancelled_at = Some(now);
        visit.cancelled_by = Some(caller.actor());
        visit.cancellation_reason = optional_text("Reason", request.reason.as_deref(), 500)?;
        visit.updated_at = now;
        let visit = self.visits.update(visit)?;
        info!(visit = %visit.id, "visit cancelled");

        let description = format!(
            "The visit to {} on {} at {} was cancelled.",
            property.name, visit.date, visit.time
        );
        match caller {
            VisitCaller::User(_) => self.notify_builder(
                &property,
                &visit,
                NotificationType::VisitCancelled,
                "Visit cancelled",
                description,
            ),
            _ => self.notify_user(
                &visit,
                NotificationType::VisitCancelled,
                "Visit cancelled",
                description,
            ),
        }
        Ok(visit)
    }

    pub fn reschedule(
        &self,
        caller: VisitCaller<'_>,
        id: &VisitId,
        request: RescheduleVisit,
    ) -> Result<Visit, ServiceError> {
        let (mut visit, property) = self.authorized(caller, id)?;
        if visit.status.is_closed() {
            return Err(ServiceError::validation("Visit cannot be rescheduled"));
        }
        ensure_not_past(request.date)?;
        if !self.is_free(&visit.property_id, request.date, request.time, Some(&visit.id))? {
            return Err(slot_taken());
        }

        let now = Utc::now();
        visit.date = request.date;
        visit.time = request.time;
        visit.status = VisitStatus::Rescheduled;
        visit.rescheduled_at = Some(now);
        visit.rescheduled_by = Some(caller.actor());
        visit.updated_at = now;
        let visit = self.visits.update(visit).map_err(slot_conflict)?;

        let description = format!(
            "The visit to {} moved to {} at {}.",
            property.name, visit.date, visit.time
        );
        match caller {
            VisitCaller::User(_) => self.notify_builder(
                &property,
                &visit,
                NotificationType::VisitRescheduled,
                "Visit rescheduled",
                description,
            ),
            _ => self.notify_user(
                &visit,
                NotificationType::VisitRescheduled,
                "Visit rescheduled",
                description,
            ),
        }
        Ok(visit)
    }

    pub fn complete(&self, caller: VisitCaller<'_>, id: &VisitId) -> Result<Visit, ServiceError> {
        if matches!(caller, VisitCaller::User(_)) {
            return Err(ServiceError::forbidden("Only the builder can complete a visit"));
        }
        let (mut visit, property) = self.authorized(caller, id)?;
        if visit.status != VisitStatus::Confirmed {
            return Err(ServiceError::validation("Only confirmed visits can be completed"));
        }
        visit.status = VisitStatus::Completed;
        visit.updated_at = Utc::now();
        let visit = self.visits.update(visit)?;

        self.notifications.notify_quietly(
            NewNotification::system(
                Recipient::user(&visit.user_id),
                NotificationType::VisitCompleted,
                "Visit completed",
                format!("Thanks for visiting {}. Let us know what you thought.", property.name),
            )
            .with_priority(Priority::Low),
        );
        Ok(visit)
    }

    pub fn booked_slots(&self, property: &PropertyId, date: NaiveDate) -> Result<BookedSlots, ServiceError> {
        self.property(property)?;
        let filter = VisitFilter {
            property_id: Some(property.clone()),
            date: Some(date),
            ..VisitFilter::default()
        };
        let mut booked: Vec<TimeSlot> = self
            .visits
            .list(&filter)?
            .into_iter()
            .filter(|visit| visit.status.is_active())
            .map(|visit| visit.time)
            .collect();
        booked.sort();
        booked.dedup();

        let available = master_time_slots()
            .into_iter()
            .filter(|slot| !booked.contains(slot))
            .collect();
        Ok(BookedSlots {
            property_id: property.clone(),
            date,
            booked,
            available,
        })
    }

    pub fn check_availability(
        &self,
        property: &PropertyId,
        date: NaiveDate,
        time: TimeSlot,
    ) -> Result<SlotAvailability, ServiceError> {
        self.property(property)?;
        Ok(SlotAvailability {
            property_id: property.clone(),
            date,
            time,
            available: self.is_free(property, date, time, None)?,
        })
    }

    /// Open visits from today on, soonest first.
    pub fn upcoming(&self, user: &UserId, page: &PageRequest) -> Result<Page<Visit>, ServiceError> {
        let today = Utc::now().date_naive();
        let filter = VisitFilter {
            user_id: Some(user.clone()),
            ..VisitFilter::default()
        };
        let mut items: Vec<Visit> = self
            .visits
            .list(&filter)?
            .into_iter()
            .filter(|visit| visit.status.is_active() && visit.date >= today)
            .collect();
        items.sort_by_key(Visit::starts_at);
        Ok(Page::paginate(items, page))
    }

    pub fn stats(&self, user: &UserId) -> Result<VisitStats, ServiceError> {
        let filter = VisitFilter {
            user_id: Some(user.clone()),
            ..VisitFilter::default()
        };
        let mut stats = VisitStats::default();
        for visit in self.visits.list(&filter)? {
            stats.total += 1;
            *stats.by_status.entry(visit.status).or_default() += 1;
        }
        Ok(stats)
    }

    /// Distinct properties the user has an open visit for, newest visit date first.
    pub fn scheduled_properties(
        &self,
        user: &UserId,
        page: &PageRequest,
    ) -> Result<Page<ScheduledProperty>, ServiceError> {
        let filter = VisitFilter {
            user_id: Some(user.clone()),
            ..VisitFilter::default()
        };
        let mut visits: Vec<Visit> = self
            .visits
            .list(&filter)?
            .into_iter()
            .filter(|visit| visit.status.is_active())
            .collect();
        visits.sort_by(|a, b| b.starts_at().cmp(&a.starts_at()));

        let mut items: Vec<ScheduledProperty> = Vec::new();
        for visit in visits {
            if items.iter().any(|item| item.property.id == visit.property_id) {
                continue;
            }
            if let Some(property) = self.properties.fetch(&visit.property_id)? {
                items.push(ScheduledProperty { property, visit });
            }
        }
        Ok(Page::paginate(items, page))
    }
}
