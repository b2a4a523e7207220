//! Denormalized user references follow renames and deletions.

mod common;

use common::{fixtures, test_log, test_store};
use yabt::model::{BacklogItem, BacklogItemType};
use yabt::services::backlog_items::comments::{self, CommentAddUpdRequest};
use yabt::services::backlog_items::{BacklogItemAddUpdRequest, commands};
use yabt::services::users;
use yabt::storage::{DocumentRead, DocumentStore};

fn load(store: &DocumentStore, id: &str) -> BacklogItem {
    store.load::<BacklogItem>(id).unwrap().unwrap()
}

fn comment(store: &mut DocumentStore, actor: &str, item: &str, message: &str) {
    comments::add(
        store,
        Some(actor),
        item,
        &CommentAddUpdRequest {
            message: message.to_string(),
        },
    )
    .unwrap();
}

#[test]
fn deleting_a_user_clears_ids_but_keeps_names() {
    let _log = test_log("deleting_a_user_clears_ids_but_keeps_names");
    let mut store = test_store();
    let (homer, marge, _) = fixtures::seed_users(&mut store);

    let item = fixtures::add_item(
        &mut store,
        &homer,
        BacklogItemType::Bug,
        &BacklogItemAddUpdRequest {
            assignee_id: Some(homer.clone()),
            ..fixtures::item_request("Donut machine jammed")
        },
    )
    .id;
    comment(&mut store, &homer, &item, "Mmm, donuts");
    comment(&mut store, &marge, &item, "Homer, no");

    users::delete(&mut store, &homer).unwrap();

    let after = load(&store, &item);
    assert!(after.assignee.is_none());

    let homer_comment = after.comments.iter().find(|c| c.message == "Mmm, donuts").unwrap();
    assert_eq!(homer_comment.author.id, None);
    assert_eq!(homer_comment.author.name, "Simpson, H.");
    assert_eq!(homer_comment.author.full_name, "Homer Simpson");

    let marge_comment = after.comments.iter().find(|c| c.message == "Homer, no").unwrap();
    assert_eq!(marge_comment.author.id.as_deref(), Some(marge.as_str()));

    let created_by = &after.modified_by[0].change.actioned_by;
    assert_eq!(created_by.id, None);
    assert_eq!(created_by.full_name, "Homer Simpson");
    assert!(
        after
            .modified_by
            .iter()
            .any(|r| r.change.actioned_by.id.as_deref() == Some(marge.as_str()))
    );
}

#[test]
fn deleting_a_user_leaves_unrelated_items_untouched() {
    let mut store = test_store();
    let (homer, marge, _) = fixtures::seed_users(&mut store);
    fixtures::add_task(&mut store, &homer, "Homer's task");
    let marges = fixtures::add_task(&mut store, &marge, "Marge's task");

    let before = load(&store, &marges);
    let etag_before = store
        .metadata(yabt::storage::Collection::BacklogItems, &marges)
        .unwrap()
        .unwrap()
        .etag;

    users::delete(&mut store, &homer).unwrap();

    assert_eq!(load(&store, &marges), before);
    let etag_after = store
        .metadata(yabt::storage::Collection::BacklogItems, &marges)
        .unwrap()
        .unwrap()
        .etag;
    assert_eq!(etag_before, etag_after);
}

#[test]
fn renaming_a_user_rewrites_references_without_new_history() {
    let mut store = test_store();
    let (homer, marge, _) = fixtures::seed_users(&mut store);

    let item = fixtures::add_item(
        &mut store,
        &marge,
        BacklogItemType::UserStory,
        &BacklogItemAddUpdRequest {
            assignee_id: Some(homer.clone()),
            ..fixtures::item_request("Make a better donut")
        },
    )
    .id;
    comment(&mut store, &homer, &item, "On it");
    let history_len = load(&store, &item).modified_by.len();

    users::update(&mut store, &homer, &fixtures::user_request("Max", "Power")).unwrap();

    let after = load(&store, &item);
    assert_eq!(after.modified_by.len(), history_len);

    let assignee = after.assignee.as_ref().unwrap();
    assert_eq!(assignee.id.as_deref(), Some(homer.as_str()));
    assert_eq!(assignee.name, "Power, M.");
    assert_eq!(assignee.full_name, "Max Power");
    assert_eq!(after.comments[0].author.full_name, "Max Power");
    assert!(
        after
            .modified_by
            .iter()
            .filter(|r| r.change.actioned_by.points_to(&homer))
            .all(|r| r.change.actioned_by.name == "Power, M.")
    );
    assert_eq!(after.modified_by[0].change.actioned_by.full_name, "Marge Simpson");
}

#[test]
fn changing_only_the_email_does_not_touch_items() {
    let mut store = test_store();
    let (homer, _, _) = fixtures::seed_users(&mut store);
    let item = fixtures::add_task(&mut store, &homer, "Nap");
    let before = load(&store, &item);

    let mut request = fixtures::user_request("Homer", "Simpson");
    request.email = "chunkylover53@aol.test".into();
    users::update(&mut store, &homer, &request).unwrap();

    assert_eq!(load(&store, &item), before);
}

#[test]
fn user_matching_is_case_insensitive() {
    let mut store = test_store();
    let (homer, _, _) = fixtures::seed_users(&mut store);
    let item = fixtures::add_task(&mut store, &homer, "Case check");

    users::update(&mut store, "users/1-a", &fixtures::user_request("Homie", "Simpson")).unwrap();
    assert_eq!(
        load(&store, &item).modified_by[0].change.actioned_by.full_name,
        "Homie Simpson"
    );

    users::delete(&mut store, &homer.to_lowercase()).unwrap();
    assert_eq!(load(&store, &item).modified_by[0].change.actioned_by.id, None);
}

#[test]
fn history_actor_lists_follow_reassignment() {
    let mut store = test_store();
    let (homer, marge, bart) = fixtures::seed_users(&mut store);
    let item = fixtures::add_task(&mut store, &homer, "Skateboard repair");

    commands::assign(&mut store, Some(&marge), &item, Some(&bart)).unwrap();
    users::delete(&mut store, &bart).unwrap();

    let after = load(&store, &item);
    assert!(after.assignee.is_none());
    // Marge made the change and keeps her id
    assert!(after.modified_by[1].change.actioned_by.points_to(&marge));
}
