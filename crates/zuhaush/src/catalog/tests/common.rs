use crate::accounts::admins::AdminSession;
use crate::accounts::builders::BuilderSession;
use crate::testing::Harness;

pub(super) struct CatalogFixture {
    pub(super) harness: Harness,
    pub(super) admin: AdminSession,
    pub(super) builder: BuilderSession,
}

pub(super) fn fixture() -> CatalogFixture {
    let harness = Harness::new();
    let admin = harness.super_admin();
    let builder = harness.approved_builder("sales@skyline.test", &admin.admin.id);
    CatalogFixture {
        harness,
        admin,
        builder,
    }
}
