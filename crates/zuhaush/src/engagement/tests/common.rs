use crate::accounts::users::UserSession;
use crate::catalog::Property;
use crate::testing::Harness;

pub(super) struct EngagementFixture {
    pub(super) harness: Harness,
    pub(super) first: Property,
    pub(super) second: Property,
    pub(super) user: UserSession,
    pub(super) builder_token: String,
    pub(super) admin_token: String,
}

pub(super) fn fixture() -> EngagementFixture {
    let harness = Harness::new();
    let admin = harness.super_admin();
    let builder = harness.approved_builder("sales@skyline.test", &admin.admin.id);
    let first = harness.listed_property(&builder.builder.id, &admin.admin.id, "Skyline Heights");
    let second = harness.listed_property(&builder.builder.id, &admin.admin.id, "Skyline Meadows");
    let user = harness.registered_user("asha@example.com");
    EngagementFixture {
        harness,
        first,
        second,
        user,
        builder_token: builder.tokens.access.token,
        admin_token: admin.tokens.access.token,
    }
}
