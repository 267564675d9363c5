use crate::accounts::users::UserSession;
use crate::catalog::Property;
use crate::testing::Harness;
use crate::visits::{ScheduleVisit, TimeSlot};

/// A harness with one approved builder, one listed property and one registered user.
pub(super) struct VisitFixture {
    pub(super) harness: Harness,
    pub(super) property: Property,
    pub(super) user: UserSession,
    pub(super) builder_token: String,
    pub(super) admin_token: String,
}

pub(super) fn fixture() -> VisitFixture {
    let harness = Harness::new();
    let admin = harness.super_admin();
    let builder = harness.approved_builder("sales@skyline.test", &admin.admin.id);
    let property = harness.listed_property(&builder.builder.id, &admin.admin.id, "Skyline Heights");
    let user = harness.registered_user("asha@example.com");
    VisitFixture {
        harness,
        property,
        user,
        builder_token: builder.tokens.access.token,
        admin_token: admin.tokens.access.token,
    }
}

pub(super) fn slot(raw: &str) -> TimeSlot {
    TimeSlot::parse(raw).expect("valid slot")
}

pub(super) fn booking(property: &Property, date: chrono::NaiveDate, time: &str) -> ScheduleVisit {
    ScheduleVisit {
        property_id: property.id.clone(),
        date,
        time: slot(time),
        notes: None,
    }
}
