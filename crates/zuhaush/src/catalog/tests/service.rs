use super::common::*;
use crate::catalog::{
    Editor, PropertyRepository, MediaInput, MediaKind, MediaUpdate, Price, PriceUnit, PropertyFilter, PropertyFlag,
    PropertyStatus, PropertyUpdate,
};
use crate::error::ServiceError;
use crate::notifications::{NotificationFilter, NotificationType, Recipient};
use crate::pagination::{PageQuery, PageRequest};
use crate::testing::property_input;

fn image(url: &str, primary: bool) -> MediaInput {
    MediaInput {
        kind: MediaKind::Image,
        url: url.to_string(),
        key: None,
        caption: None,
        is_primary: primary,
    }
}

#[test]
fn new_listings_wait_for_approval() {
    let fx = fixture();
    let properties = &fx.harness.app.properties;
    let created = properties
        .create(&fx.builder.builder.id, property_input("Skyline Heights"))
        .expect("created");
    assert!(!created.admin_approved);
    assert!(!created.is_listed());
    assert_eq!(created.slug, "skyline-heights");
    assert_eq!(created.bhk.as_deref(), Some("2BHK"));

    let public = properties
        .search(&PropertyFilter::default(), &PageRequest::default())
        .expect("search");
    assert_eq!(public.total_results, 0);

    let approved = properties
        .approve(&fx.admin.admin.id, &created.id)
        .expect("approved");
    assert!(approved.is_listed());
    assert_eq!(approved.approved_by.as_ref(), Some(&fx.admin.admin.id));

    let inbox = fx
        .harness
        .app
        .notifications
        .list(
            &Recipient::builder(&fx.builder.builder.id),
            &NotificationFilter {
                notification_type: Some(NotificationType::PropertyApproved),
                ..NotificationFilter::default()
            },
            &PageRequest::default(),
        )
        .expect("inbox");
    assert_eq!(inbox.total_results, 1);
}

#[test]
fn slugs_are_deduplicated_or_rejected_when_explicit() {
    let fx = fixture();
    let properties = &fx.harness.app.properties;
    let builder = &fx.builder.builder.id;
    properties
        .create(builder, property_input("Skyline Heights"))
        .expect("first");
    let second = properties
        .create(builder, property_input("Skyline  Heights!"))
        .expect("second");
    assert_eq!(second.slug, "skyline-heights-2");

    let mut explicit = property_input("Another");
    explicit.slug = Some("Skyline Heights".to_string());
    assert!(matches!(
        properties.create(builder, explicit),
        Err(ServiceError::Conflict(_))
    ));
    let found = properties.get_by_slug("skyline-heights-2").expect("by slug");
    assert_eq!(found.id, second.id);
}

#[test]
fn invalid_inputs_are_rejected() {
    let fx = fixture();
    let properties = &fx.harness.app.properties;
    let builder = &fx.builder.builder.id;

    let mut bad_bhk = property_input("Odd");
    bad_bhk.bhk = Some("two bedrooms".to_string());
    assert!(matches!(
        properties.create(builder, bad_bhk),
        Err(ServiceError::Validation(_))
    ));

    let mut negative = property_input("Cheap");
    negative.price = Price {
        value: -1.0,
        unit: PriceUnit::Rupees,
    };
    assert!(matches!(
        properties.create(builder, negative),
        Err(ServiceError::Validation(_))
    ));

    assert!(matches!(
        properties.create(&"missing".into(), property_input("Orphan")),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn builders_only_edit_their_own_listings() {
    let fx = fixture();
    let properties = &fx.harness.app.properties;
    let listing = fx
        .harness
        .listed_property(&fx.builder.builder.id, &fx.admin.admin.id, "Skyline Heights");
    let rival = fx.harness.verified_builder("hello@rival.test");

    let err = properties
        .update(
            Editor::Builder(&rival.builder.id),
            &listing.id,
            PropertyUpdate {
                name: Some("Stolen".to_string()),
                ..PropertyUpdate::default()
            },
        )
        .expect_err("not the owner");
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let updated = properties
        .update(
            Editor::Builder(&fx.builder.builder.id),
            &listing.id,
            PropertyUpdate {
                price: Some(Price {
                    value: 1.2,
                    unit: PriceUnit::Crore,
                }),
                status: Some(PropertyStatus::Sold),
                ..PropertyUpdate::default()
            },
        )
        .expect("owner edits");
    assert_eq!(updated.status, PropertyStatus::Sold);
    assert!(!updated.is_listed());

    properties
        .delete(Editor::Admin(&fx.admin.admin.id), &listing.id)
        .expect("admin deletes");
    assert!(matches!(
        properties.get(&listing.id),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn first_media_becomes_primary_and_primary_moves_on_removal() {
    let fx = fixture();
    let properties = &fx.harness.app.properties;
    let owner = Editor::Builder(&fx.builder.builder.id);
    let listing = properties
        .create(&fx.builder.builder.id, property_input("Skyline Heights"))
        .expect("created");

    let with_one = properties
        .add_media(owner, &listing.id, image("https://cdn.test/a.jpg", false))
        .expect("added");
    assert!(with_one.media[0].is_primary);

    let with_two = properties
        .add_media(owner, &listing.id, image("https://cdn.test/b.jpg", false))
        .expect("added");
    assert_eq!(with_two.media.iter().filter(|m| m.is_primary).count(), 1);
    let second = with_two.media[1].id.clone();

    let promoted = properties
        .update_media(
            owner,
            &listing.id,
            &second,
            MediaUpdate {
                is_primary: Some(true),
                caption: Some("Balcony".to_string()),
            },
        )
        .expect("promoted");
    assert_eq!(promoted.primary_media().map(|m| &m.id), Some(&second));

    let after = properties
        .remove_media(owner, &listing.id, &second)
        .expect("removed");
    assert_eq!(after.media.len(), 1);
    assert!(after.media[0].is_primary);

    assert!(matches!(
        properties.remove_media(owner, &listing.id, &second),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn flags_drive_curated_listings() {
    let fx = fixture();
    let properties = &fx.harness.app.properties;
    let listing = fx
        .harness
        .listed_property(&fx.builder.builder.id, &fx.admin.admin.id, "Skyline Heights");
    fx.harness
        .listed_property(&fx.builder.builder.id, &fx.admin.admin.id, "Skyline Meadows");

    properties
        .set_flag(&listing.id, PropertyFlag::Featured, true)
        .expect("flagged");
    let featured = properties
        .flagged(PropertyFlag::Featured, &PageRequest::default())
        .expect("featured");
    assert_eq!(featured.total_results, 1);
    assert_eq!(featured.results[0].id, listing.id);

    properties
        .set_flag(&listing.id, PropertyFlag::Featured, false)
        .expect("unflagged");
    assert_eq!(
        properties
            .flagged(PropertyFlag::Featured, &PageRequest::default())
            .expect("featured")
            .total_results,
        0
    );
}

#[test]
fn search_filters_and_sorts() {
    let fx = fixture();
    let properties = &fx.harness.app.properties;
    let builder = &fx.builder.builder.id;
    let admin = &fx.admin.admin.id;

    let mut villa = property_input("Green Villa");
    villa.city = "Mumbai".to_string();
    villa.price = Price {
        value: 2.5,
        unit: PriceUnit::Crore,
    };
    let villa = properties.create(builder, villa).expect("created");
    properties.approve(admin, &villa.id).expect("approved");
    fx.harness.listed_property(builder, admin, "Skyline Heights");

    let in_mumbai = properties
        .search(
            &PropertyFilter {
                city: Some("mumbai".to_string()),
                ..PropertyFilter::default()
            },
            &PageRequest::default(),
        )
        .expect("search");
    assert_eq!(in_mumbai.total_results, 1);

    let affordable = properties
        .search(
            &PropertyFilter {
                max_price: Some(1_00_00_000.0),
                ..PropertyFilter::default()
            },
            &PageRequest::default(),
        )
        .expect("search");
    assert_eq!(affordable.total_results, 1);
    assert_eq!(affordable.results[0].name, "Skyline Heights");

    let by_price = PageRequest::from_query(&PageQuery {
        sort_by: Some("price:desc".to_string()),
        ..PageQuery::default()
    })
    .expect("parsed");
    let sorted = properties
        .search(&PropertyFilter::default(), &by_price)
        .expect("search");
    assert_eq!(sorted.results[0].id, villa.id);

    let text = properties
        .search(
            &PropertyFilter {
                q: Some("baner".to_string()),
                ..PropertyFilter::default()
            },
            &PageRequest::default(),
        )
        .expect("search");
    assert_eq!(text.total_results, 2);
}

#[test]
fn counters_and_builder_stats() {
    let fx = fixture();
    let properties = &fx.harness.app.properties;
    let listing = fx
        .harness
        .listed_property(&fx.builder.builder.id, &fx.admin.admin.id, "Skyline Heights");
    properties
        .create(&fx.builder.builder.id, property_input("Draft Tower"))
        .expect("pending");

    assert_eq!(properties.record_view(&listing.id).expect("view"), 1);
    assert_eq!(properties.record_view(&listing.id).expect("view"), 2);
    assert_eq!(properties.record_inquiry(&listing.id).expect("inquiry"), 1);
    assert!(matches!(
        properties.record_view(&"missing".into()),
        Err(ServiceError::NotFound(_))
    ));

    let stats = properties
        .builder_stats(&fx.builder.builder.id)
        .expect("stats");
    assert_eq!(stats.total, 2);
    assert_eq!(stats.approved, 1);
    assert_eq!(stats.pending_approval, 1);
    assert_eq!(stats.views, 2);
    assert_eq!(stats.inquiries, 1);
}

#[test]
fn record_updates_keep_counters_moved_in_between() {
    let fx = fixture();
    let properties = &fx.harness.app.properties;
    let listing = fx
        .harness
        .listed_property(&fx.builder.builder.id, &fx.admin.admin.id, "Skyline Heights");

    let stale = fx
        .harness
        .store
        .properties
        .fetch(&listing.id)
        .expect("store")
        .expect("stored");
    properties.record_view(&listing.id).expect("view");
    fx.harness
        .app
        .likes
        .toggle(&fx.harness.registered_user("asha@example.com").user.id, &listing.id)
        .expect("liked");

    let mut renamed = stale;
    renamed.name = "Skyline Heights II".to_string();
    fx.harness.store.properties.update(renamed).expect("updated");

    let flagged = properties
        .set_flag(&listing.id, PropertyFlag::Trending, true)
        .expect("flagged");
    assert_eq!(flagged.name, "Skyline Heights II");
    assert_eq!(flagged.views, 1);
    assert_eq!(flagged.likes, 1);
}

#[test]
fn rejection_requires_a_reason_and_unlists() {
    let fx = fixture();
    let properties = &fx.harness.app.properties;
    let listing = fx
        .harness
        .listed_property(&fx.builder.builder.id, &fx.admin.admin.id, "Skyline Heights");

    assert!(matches!(
        properties.reject(&fx.admin.admin.id, &listing.id, "  "),
        Err(ServiceError::Validation(_))
    ));
    let rejected = properties
        .reject(&fx.admin.admin.id, &listing.id, "Missing RERA number")
        .expect("rejected");
    assert!(!rejected.admin_approved);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Missing RERA number"));
    assert!(!rejected.is_listed());
}
