use crate::accounts::builders::{NewTeamMember, TeamMemberUpdate, TeamPermissions};
use crate::error::ServiceError;
use crate::testing::{Harness, PASSWORD};

fn member(email: &str) -> NewTeamMember {
    NewTeamMember {
        name: "Kiran Rao".to_string(),
        email: email.to_string(),
        password: "memb3r-pass".to_string(),
        role: Some("sales".to_string()),
        permissions: TeamPermissions {
            users: false,
            ..TeamPermissions::default()
        },
    }
}

#[test]
fn members_sign_in_for_their_builder() {
    let harness = Harness::new();
    let owner = harness.verified_builder("sales@skyline.test");
    let builders = &harness.app.builders;

    let added = builders
        .add_team_member(&owner.builder.id, member("kiran@skyline.test"))
        .expect("added");
    assert_eq!(added.role, "sales");

    let session = builders
        .team_member_login("Kiran@Skyline.test", "memb3r-pass")
        .expect("member login");
    assert_eq!(session.builder.id, owner.builder.id);
    assert_eq!(session.member.as_ref().map(|m| &m.id), Some(&added.id));

    let principal = harness
        .app
        .authenticator
        .builder(&session.tokens.access.token)
        .expect("member principal");
    assert!(!principal.is_owner());
    assert!(principal
        .require(crate::accounts::builders::TeamPermission::Users)
        .is_err());
    assert!(principal
        .require(crate::accounts::builders::TeamPermission::MyProperties)
        .is_ok());
}

#[test]
fn member_emails_are_unique_everywhere() {
    let harness = Harness::new();
    let owner = harness.verified_builder("sales@skyline.test");
    let rival = harness.verified_builder("hello@rival.test");
    let builders = &harness.app.builders;

    builders
        .add_team_member(&owner.builder.id, member("kiran@skyline.test"))
        .expect("added");
    assert!(matches!(
        builders.add_team_member(&owner.builder.id, member("kiran@skyline.test")),
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        builders.add_team_member(&owner.builder.id, member("sales@skyline.test")),
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        builders.add_team_member(&rival.builder.id, member("kiran@skyline.test")),
        Err(ServiceError::Conflict(_))
    ));
}

#[test]
fn deactivated_members_are_locked_out() {
    let harness = Harness::new();
    let owner = harness.verified_builder("sales@skyline.test");
    let builders = &harness.app.builders;
    let added = builders
        .add_team_member(&owner.builder.id, member("kiran@skyline.test"))
        .expect("added");
    let session = builders
        .team_member_login("kiran@skyline.test", "memb3r-pass")
        .expect("member login");

    builders
        .update_team_member(
            &owner.builder.id,
            &added.id,
            TeamMemberUpdate {
                is_active: Some(false),
                ..TeamMemberUpdate::default()
            },
        )
        .expect("deactivated");

    assert!(matches!(
        builders.team_member_login("kiran@skyline.test", "memb3r-pass"),
        Err(ServiceError::Unauthorized(_))
    ));
    assert!(builders.refresh_tokens(&session.tokens.refresh.token).is_err());
    assert!(harness
        .app
        .authenticator
        .builder(&session.tokens.access.token)
        .is_err());
}

#[test]
fn removing_a_member_frees_the_email() {
    let harness = Harness::new();
    let owner = harness.verified_builder("sales@skyline.test");
    let builders = &harness.app.builders;
    let added = builders
        .add_team_member(&owner.builder.id, member("kiran@skyline.test"))
        .expect("added");

    builders
        .remove_team_member(&owner.builder.id, &added.id)
        .expect("removed");
    assert!(matches!(
        builders.team_member(&owner.builder.id, &added.id),
        Err(ServiceError::NotFound(_))
    ));
    assert!(builders
        .team_member_login("kiran@skyline.test", "memb3r-pass")
        .is_err());
    builders
        .add_team_member(&owner.builder.id, member("kiran@skyline.test"))
        .expect("re-added");
}

#[test]
fn owner_password_change_ends_sessions() {
    let harness = Harness::new();
    let owner = harness.verified_builder("sales@skyline.test");
    let builders = &harness.app.builders;
    let principal = harness
        .app
        .authenticator
        .builder(&owner.tokens.access.token)
        .expect("owner principal");

    assert!(matches!(
        builders.change_password(&principal, "wrong-pass1", "n3w-password"),
        Err(ServiceError::Unauthorized(_))
    ));
    builders
        .change_password(&principal, PASSWORD, "n3w-password")
        .expect("changed");
    assert!(builders.refresh_tokens(&owner.tokens.refresh.token).is_err());
    builders
        .login("sales@skyline.test", "n3w-password")
        .expect("new password works");
}
