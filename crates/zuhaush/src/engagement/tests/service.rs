use super::common::*;
use crate::engagement::domain::COMMENT_MAX_CHARS;
use crate::engagement::{CommentFilter, CommentInput, CommentStatus};
use crate::error::ServiceError;
use crate::pagination::{PageQuery, PageRequest};

fn text(body: &str) -> CommentInput {
    CommentInput {
        text: body.to_string(),
    }
}

#[test]
fn toggling_a_like_twice_restores_the_count() {
    let fx = fixture();
    let likes = &fx.harness.app.likes;
    let user = &fx.user.user.id;

    let liked = likes.toggle(user, &fx.first.id).expect("like");
    assert!(liked.liked);
    assert_eq!(liked.like_count, 1);
    assert!(likes.status(user, &fx.first.id).expect("status").liked);

    let unliked = likes.toggle(user, &fx.first.id).expect("unlike");
    assert!(!unliked.liked);
    assert_eq!(unliked.like_count, 0);
    assert_eq!(unliked.message, "Property unliked");
    assert_eq!(
        fx.harness.app.properties.get(&fx.first.id).expect("property").likes,
        0
    );
}

#[test]
fn liking_a_missing_property_is_not_found() {
    let fx = fixture();
    let err = fx
        .harness
        .app
        .likes
        .toggle(&fx.user.user.id, &"missing".into())
        .expect_err("unknown property");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[test]
fn liked_properties_lists_current_likes() {
    let fx = fixture();
    let likes = &fx.harness.app.likes;
    let user = &fx.user.user.id;
    likes.toggle(user, &fx.first.id).expect("like");
    likes.toggle(user, &fx.second.id).expect("like");
    likes.toggle(user, &fx.first.id).expect("unlike");

    let page = likes
        .liked_properties(user, &PageRequest::default())
        .expect("liked");
    assert_eq!(page.total_results, 1);
    assert_eq!(page.results[0].id, fx.second.id);

    let other = fx.harness.registered_user("ravi@example.com");
    likes.toggle(&other.user.id, &fx.second.id).expect("like");
    let likers = likes
        .for_property(&fx.second.id, &PageRequest::default())
        .expect("likers");
    assert_eq!(likers.total_results, 2);
}

#[test]
fn comments_are_owned_by_their_author() {
    let fx = fixture();
    let comments = &fx.harness.app.comments;
    let author = &fx.user.user.id;
    let comment = comments
        .create(author, &fx.first.id, text("  Great light in the living room  "))
        .expect("posted");
    assert_eq!(comment.text, "Great light in the living room");
    assert!(!comment.is_edited);

    let stranger = fx.harness.registered_user("ravi@example.com");
    let err = comments
        .update(&stranger.user.id, &comment.id, text("spam"))
        .expect_err("not the author");
    assert!(matches!(err, ServiceError::Forbidden(_)));
    let err = comments
        .delete(&stranger.user.id, &comment.id)
        .expect_err("not the author");
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let edited = comments
        .update(author, &comment.id, text("Great light, small kitchen"))
        .expect("edited");
    assert!(edited.is_edited);
    assert!(edited.edited_at.is_some());
}

#[test]
fn deleted_comments_disappear_but_are_kept() {
    let fx = fixture();
    let comments = &fx.harness.app.comments;
    let author = &fx.user.user.id;
    let comment = comments
        .create(author, &fx.first.id, text("Is parking included?"))
        .expect("posted");

    comments.delete(author, &comment.id).expect("deleted");
    assert!(matches!(
        comments.get(&comment.id),
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        comments.delete(author, &comment.id),
        Err(ServiceError::NotFound(_))
    ));
    assert_eq!(
        comments
            .for_property(&fx.first.id, &PageRequest::default())
            .expect("listing")
            .total_results,
        0
    );

    let archived = comments
        .list(
            &CommentFilter {
                status: Some(CommentStatus::Deleted),
                ..CommentFilter::default()
            },
            &PageRequest::default(),
        )
        .expect("admin listing");
    assert_eq!(archived.total_results, 1);
}

#[test]
fn comment_text_is_bounded() {
    let fx = fixture();
    let comments = &fx.harness.app.comments;
    let author = &fx.user.user.id;
    assert!(matches!(
        comments.create(author, &fx.first.id, text("   ")),
        Err(ServiceError::Validation(_))
    ));
    let long = "a".repeat(COMMENT_MAX_CHARS + 1);
    assert!(matches!(
        comments.create(author, &fx.first.id, text(&long)),
        Err(ServiceError::Validation(_))
    ));
    assert!(comments
        .create(author, &fx.first.id, text(&"a".repeat(COMMENT_MAX_CHARS)))
        .is_ok());
}

#[test]
fn moderation_hides_comments_from_the_public() {
    let fx = fixture();
    let comments = &fx.harness.app.comments;
    let comment = comments
        .create(&fx.user.user.id, &fx.first.id, text("Call me at 98765"))
        .expect("posted");

    let flagged = comments
        .moderate(&comment.id, CommentStatus::Flagged)
        .expect("flagged");
    assert_eq!(flagged.status, CommentStatus::Flagged);
    assert_eq!(
        comments
            .for_property(&fx.first.id, &PageRequest::default())
            .expect("public listing")
            .total_results,
        0
    );
    assert_eq!(
        comments
            .for_user(&fx.user.user.id, &PageRequest::default())
            .expect("author listing")
            .total_results,
        1
    );
}

#[test]
fn builder_inbox_collects_comments_on_owned_listings() {
    let fx = fixture();
    let comments = &fx.harness.app.comments;
    comments
        .create(&fx.user.user.id, &fx.first.id, text("Nice"))
        .expect("posted");
    comments
        .create(&fx.user.user.id, &fx.second.id, text("Also nice"))
        .expect("posted");

    let inbox = comments
        .builder_inbox(&fx.first.builder_id, &PageRequest::default())
        .expect("inbox");
    assert_eq!(inbox.total_results, 2);

    let other = fx.harness.verified_builder("hello@other.test");
    let empty = comments
        .builder_inbox(&other.builder.id, &PageRequest::default())
        .expect("inbox");
    assert_eq!(empty.total_results, 0);
}

#[test]
fn comment_listing_rejects_unknown_sort_fields() {
    let fx = fixture();
    let page = PageRequest::from_query(&PageQuery {
        sort_by: Some("text:asc".to_string()),
        ..PageQuery::default()
    })
    .expect("parsed");
    let err = fx
        .harness
        .app
        .comments
        .for_user(&fx.user.user.id, &page)
        .expect_err("unsortable");
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[test]
fn view_history_ranks_most_viewed_listings() {
    let fx = fixture();
    let views = &fx.harness.app.views;
    let user = &fx.user.user.id;
    for _ in 0..3 {
        views.track(user, &fx.first.id).expect("tracked");
    }
    views.track(user, &fx.second.id).expect("tracked");

    let stats = views.stats(user).expect("stats");
    assert_eq!(stats.total_views, 4);
    assert_eq!(stats.unique_property_count, 2);
    assert!(stats.first_viewed_at <= stats.last_viewed_at);

    let ranked = views.most_viewed(user, None).expect("ranked");
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].property.id, fx.first.id);
    assert_eq!(ranked[0].view_count, 3);

    let top = views.most_viewed(user, Some(1)).expect("ranked");
    assert_eq!(top.len(), 1);
    assert!(matches!(
        views.most_viewed(user, Some(0)),
        Err(ServiceError::Validation(_))
    ));

    let history = views
        .for_user(user, &PageRequest::default())
        .expect("history");
    assert_eq!(history.total_results, 4);
    assert_eq!(
        fx.harness.app.properties.get(&fx.first.id).expect("property").views,
        0
    );
}

#[test]
fn empty_history_has_no_bounds() {
    let fx = fixture();
    let stats = fx.harness.app.views.stats(&fx.user.user.id).expect("stats");
    assert_eq!(stats.total_views, 0);
    assert!(stats.first_viewed_at.is_none());
    assert!(stats.last_viewed_at.is_none());
}
