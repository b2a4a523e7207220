//! Backlog item commands against a real store.

mod common;

use common::{fixtures, test_log, test_store};
use serde_json::json;
use std::collections::BTreeMap;
use yabt::YabtError;
use yabt::model::{
    BacklogItem, BacklogItemDetails, BacklogItemState, BacklogItemType, BacklogRelationshipType,
    BugSeverity, CustomFieldType,
};
use yabt::services::backlog_items::comments::{self, CommentAddUpdRequest};
use yabt::services::backlog_items::{BacklogItemAddUpdRequest, commands, queries};
use yabt::services::custom_fields::{self, CustomFieldAddRequest};
use yabt::storage::{DocumentRead, DocumentStore};

fn load(store: &DocumentStore, id: &str) -> BacklogItem {
    store.load::<BacklogItem>(id).unwrap().unwrap()
}

fn related(pairs: &[(&str, BacklogRelationshipType)]) -> BTreeMap<String, BacklogRelationshipType> {
    pairs.iter().map(|(id, t)| ((*id).to_string(), *t)).collect()
}

#[test]
fn create_records_creator_and_type_details() {
    let _log = test_log("create_records_creator_and_type_details");
    let mut store = test_store();
    let (homer, _, _) = fixtures::seed_users(&mut store);

    let bug = fixtures::add_item(
        &mut store,
        &homer,
        BacklogItemType::Bug,
        &BacklogItemAddUpdRequest {
            severity: Some(BugSeverity::Critical),
            steps_to_reproduce: Some("Press the big red button".into()),
            description: Some("ignored for bugs".into()),
            tags: vec!["plant".into(), " Plant ".into()],
            ..fixtures::item_request("  Reactor alarm  ")
        },
    );

    assert_eq!(bug.id, "1-A");
    assert_eq!(bug.title, "Reactor alarm");
    assert_eq!(bug.state, BacklogItemState::New);
    assert_eq!(bug.tags, vec!["plant"]);
    assert_eq!(bug.created.as_ref().unwrap().actioned_by.full_name, "Homer Simpson");
    assert_eq!(bug.created, bug.last_updated);
    let BacklogItemDetails::Bug(details) = &bug.details else {
        panic!("expected bug details");
    };
    assert_eq!(details.severity, Some(BugSeverity::Critical));
    assert_eq!(details.steps_to_reproduce.as_deref(), Some("Press the big red button"));
}

#[test]
fn create_requires_a_known_actor() {
    let mut store = test_store();
    fixtures::seed_users(&mut store);

    let request = fixtures::item_request("Orphan");
    let err = commands::create(&mut store, None, BacklogItemType::Task, &request).unwrap_err();
    assert!(matches!(err, YabtError::CurrentUserRequired));

    let err = commands::create(&mut store, Some("99-A"), BacklogItemType::Task, &request).unwrap_err();
    assert!(matches!(err, YabtError::UserNotFound { .. }));
    assert!(store.query_all::<BacklogItem>().unwrap().is_empty());
}

#[test]
fn invalid_requests_collect_every_error() {
    let mut store = test_store();
    let (homer, _, _) = fixtures::seed_users(&mut store);

    let err = commands::create(
        &mut store,
        Some(&homer),
        BacklogItemType::Task,
        &BacklogItemAddUpdRequest {
            title: "   ".into(),
            estimated_size: Some(-1.0),
            tags: vec!["x".repeat(31)],
            ..BacklogItemAddUpdRequest::default()
        },
    )
    .unwrap_err();

    let YabtError::ValidationErrors { errors } = err else {
        panic!("expected several validation errors, got {err:?}");
    };
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["title", "estimatedSize", "tags"]);
}

#[test]
fn relations_are_mirrored_on_create_update_and_delete() {
    let mut store = test_store();
    let (homer, marge, _) = fixtures::seed_users(&mut store);
    let blocker = fixtures::add_task(&mut store, &homer, "Fix the roof");
    let other = fixtures::add_task(&mut store, &homer, "Buy paint");

    let item = fixtures::add_item(
        &mut store,
        &marge,
        BacklogItemType::Feature,
        &BacklogItemAddUpdRequest {
            related_items: related(&[
                (&blocker, BacklogRelationshipType::BlockedBy),
                (&other, BacklogRelationshipType::Related),
            ]),
            ..fixtures::item_request("Paint the house")
        },
    )
    .id;

    let mirrored = load(&store, &blocker);
    let link = mirrored.relation_to(&item).unwrap();
    assert_eq!(link.link_type, BacklogRelationshipType::Blocks);
    assert_eq!(link.related_to.name, "Paint the house");
    assert!(mirrored.last_updated().unwrap().change.actioned_by.points_to(&marge));

    // Drop one link and flip the other
    let mut request = BacklogItemAddUpdRequest::from(&load(&store, &item));
    request.related_items = related(&[(&blocker, BacklogRelationshipType::Causes)]);
    commands::update(&mut store, Some(&marge), &item, &request).unwrap();

    assert_eq!(
        load(&store, &blocker).relation_to(&item).unwrap().link_type,
        BacklogRelationshipType::CausedBy
    );
    assert!(load(&store, &other).relation_to(&item).is_none());

    commands::delete(&mut store, &item).unwrap();
    assert!(load(&store, &blocker).related_items.is_empty());
    assert!(store.load::<BacklogItem>(&item).unwrap().is_none());
}

#[test]
fn relation_to_self_or_missing_item_is_rejected() {
    let mut store = test_store();
    let (homer, _, _) = fixtures::seed_users(&mut store);
    let item = fixtures::add_task(&mut store, &homer, "Loop");

    let mut request = fixtures::item_request("Loop");
    request.related_items = related(&[(&item, BacklogRelationshipType::Related)]);
    let err = commands::update(&mut store, Some(&homer), &item, &request).unwrap_err();
    assert!(matches!(err, YabtError::Validation { ref field, .. } if field == "relatedItems"));

    request.related_items = related(&[("42-A", BacklogRelationshipType::Related)]);
    let err = commands::update(&mut store, Some(&homer), &item, &request).unwrap_err();
    assert!(matches!(err, YabtError::BacklogItemNotFound { .. }));
}

#[test]
fn relation_ids_in_any_form_name_one_target() {
    let mut store = test_store();
    let (homer, _, _) = fixtures::seed_users(&mut store);
    let reactor = fixtures::add_task(&mut store, &homer, "Reactor");

    let mut request = fixtures::item_request("Meltdown");
    request.related_items = related(&[
        ("1-A", BacklogRelationshipType::Blocks),
        ("BacklogItems/1-a", BacklogRelationshipType::Related),
    ]);
    let err = commands::create(&mut store, Some(&homer), BacklogItemType::Bug, &request)
        .unwrap_err();
    assert!(matches!(err, YabtError::Validation { ref field, .. } if field == "relatedItems"));
    assert!(load(&store, &reactor).related_items.is_empty());
    assert_eq!(store.query_all::<BacklogItem>().unwrap().len(), 1);

    request.related_items = related(&[("backlogitems/1-a", BacklogRelationshipType::Blocks)]);
    let meltdown = commands::create(&mut store, Some(&homer), BacklogItemType::Bug, &request)
        .unwrap()
        .id;
    let links = load(&store, &meltdown).related_items;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].related_to.id, "1-A");
    let mirror = load(&store, &reactor).related_items;
    assert_eq!(mirror.len(), 1);
    assert_eq!(mirror[0].related_to.id, meltdown);
    assert_eq!(mirror[0].link_type, BacklogRelationshipType::BlockedBy);
}

#[test]
fn update_keeps_state_comments_and_type() {
    let mut store = test_store();
    let (homer, marge, _) = fixtures::seed_users(&mut store);
    let item = fixtures::add_task(&mut store, &homer, "Mow lawn");
    commands::set_state(&mut store, Some(&homer), &item, BacklogItemState::InProgress).unwrap();
    comments::add(
        &mut store,
        Some(&marge),
        &item,
        &CommentAddUpdRequest {
            message: "Use the new mower".into(),
        },
    )
    .unwrap();

    let updated = commands::update(
        &mut store,
        Some(&marge),
        &item,
        &BacklogItemAddUpdRequest {
            description: Some("Front and back".into()),
            severity: Some(BugSeverity::Minor),
            ..fixtures::item_request("Mow the lawn")
        },
    )
    .unwrap();

    assert_eq!(updated.title, "Mow the lawn");
    assert_eq!(updated.state, BacklogItemState::InProgress);
    assert_eq!(updated.comments.len(), 1);
    assert_eq!(updated.history.len(), 4);
    assert!(matches!(updated.details, BacklogItemDetails::Task(ref d) if d.description.as_deref() == Some("Front and back")));
    assert!(updated.last_updated.unwrap().actioned_by.points_to(&marge));
}

#[test]
fn set_state_and_assign_only_record_real_changes() {
    let mut store = test_store();
    let (homer, marge, _) = fixtures::seed_users(&mut store);
    let item = fixtures::add_task(&mut store, &homer, "Take out trash");

    commands::set_state(&mut store, Some(&homer), &item, BacklogItemState::New).unwrap();
    assert_eq!(load(&store, &item).modified_by.len(), 1);

    let done = commands::set_state(&mut store, Some(&homer), &item, BacklogItemState::Done).unwrap();
    assert_eq!(done.history.last().unwrap().summary, "Changed state to 'done'");

    let assigned = commands::assign(&mut store, Some(&homer), &item, Some(&marge)).unwrap();
    assert_eq!(assigned.assignee.unwrap().name, "Simpson, M.");
    commands::assign(&mut store, Some(&homer), &item, Some(&marge)).unwrap();
    let unassigned = commands::assign(&mut store, Some(&homer), &item, None).unwrap();
    assert!(unassigned.assignee.is_none());
    assert_eq!(unassigned.history.len(), 4);

    let err = commands::assign(&mut store, Some(&homer), &item, Some("99-A")).unwrap_err();
    assert!(matches!(err, YabtError::UserNotFound { .. }));
}

#[test]
fn custom_field_values_are_type_checked() {
    let mut store = test_store();
    let (homer, _, _) = fixtures::seed_users(&mut store);
    let cost = fixtures::add_field(&mut store, "Cost", CustomFieldType::Numeric);
    let link = fixtures::add_field(&mut store, "Ticket", CustomFieldType::Url);

    let mut request = fixtures::item_request("Expensive");
    request.custom_fields.insert(cost.clone(), json!(1200.5));
    request.custom_fields.insert(link.clone(), json!("https://tickets.test/1"));
    let item = fixtures::add_item(&mut store, &homer, BacklogItemType::Task, &request);
    assert_eq!(item.custom_fields.len(), 2);
    let cost_value = item.custom_fields.iter().find(|f| f.id == cost).unwrap();
    assert_eq!(cost_value.name, "Cost");
    assert_eq!(cost_value.value, json!(1200.5));

    request.custom_fields.insert(cost.clone(), json!("a lot"));
    let err = commands::create(&mut store, Some(&homer), BacklogItemType::Task, &request).unwrap_err();
    assert!(matches!(err, YabtError::Validation { ref field, .. } if *field == format!("customFields.{cost}")));

    request.custom_fields.clear();
    request.custom_fields.insert("77-A".into(), json!(1));
    let err = commands::create(&mut store, Some(&homer), BacklogItemType::Task, &request).unwrap_err();
    assert!(matches!(err, YabtError::CustomFieldNotFound { .. }));
}

#[test]
fn mandatory_fields_apply_per_item_type() {
    let mut store = test_store();
    let (homer, _, _) = fixtures::seed_users(&mut store);
    let customer = custom_fields::create(
        &mut store,
        &CustomFieldAddRequest {
            name: "Customer".into(),
            field_type: CustomFieldType::Text,
            is_mandatory: true,
            backlog_item_types: vec![BacklogItemType::Bug],
        },
    )
    .unwrap()
    .id;

    // Not a bug: the field neither applies nor is required
    fixtures::add_task(&mut store, &homer, "Internal chore");
    let mut request = fixtures::item_request("Internal chore 2");
    request.custom_fields.insert(customer.clone(), json!("Mr. Burns"));
    let err = commands::create(&mut store, Some(&homer), BacklogItemType::Task, &request).unwrap_err();
    assert!(matches!(err, YabtError::Validation { .. }));

    let err = commands::create(
        &mut store,
        Some(&homer),
        BacklogItemType::Bug,
        &fixtures::item_request("Bug without customer"),
    )
    .unwrap_err();
    assert!(matches!(err, YabtError::Validation { ref reason, .. } if reason.contains("mandatory")));

    let bug = commands::create(&mut store, Some(&homer), BacklogItemType::Bug, &request).unwrap();
    assert_eq!(bug.custom_fields[0].value, json!("Mr. Burns"));
}

#[test]
fn comments_are_author_only() {
    let mut store = test_store();
    let (homer, marge, _) = fixtures::seed_users(&mut store);
    let item = fixtures::add_task(&mut store, &homer, "Family dinner");

    let comment = comments::add(
        &mut store,
        Some(&marge),
        &item,
        &CommentAddUpdRequest {
            message: "  Pork chops  ".into(),
        },
    )
    .unwrap();
    assert_eq!(comment.message, "Pork chops");

    let edit = CommentAddUpdRequest {
        message: "Donuts".into(),
    };
    let err = comments::update(&mut store, Some(&homer), &item, &comment.id, &edit).unwrap_err();
    assert!(matches!(err, YabtError::Forbidden { .. }));
    let err = comments::delete(&mut store, Some(&homer), &item, &comment.id).unwrap_err();
    assert!(matches!(err, YabtError::Forbidden { .. }));

    let edited = comments::update(
        &mut store,
        Some(&marge),
        &item,
        &comment.id,
        &CommentAddUpdRequest {
            message: "Pork chops and salad".into(),
        },
    )
    .unwrap();
    assert_eq!(edited.created, comment.created);
    assert!(edited.last_modified >= comment.last_modified);

    comments::delete(&mut store, Some(&marge), &item, &comment.id).unwrap();
    assert!(comments::list(&store, &item).unwrap().is_empty());

    let err = comments::delete(&mut store, Some(&marge), &item, &comment.id).unwrap_err();
    assert!(matches!(err, YabtError::CommentNotFound { .. }));
}

#[test]
fn comments_list_newest_first() {
    let mut store = test_store();
    let (homer, _, _) = fixtures::seed_users(&mut store);
    let item = fixtures::add_task(&mut store, &homer, "Chatty");

    for message in ["first", "second", "third"] {
        comments::add(
            &mut store,
            Some(&homer),
            &item,
            &CommentAddUpdRequest {
                message: message.into(),
            },
        )
        .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
    }

    let listed: Vec<String> = comments::list(&store, &item)
        .unwrap()
        .into_iter()
        .map(|c| c.message)
        .collect();
    assert_eq!(listed, vec!["third", "second", "first"]);
    assert_eq!(queries::get(&store, &item).unwrap().comments[0].message, "third");
}

#[test]
fn missing_items_are_not_found() {
    let mut store = test_store();
    let (homer, _, _) = fixtures::seed_users(&mut store);

    assert!(matches!(
        queries::get(&store, "5-A").unwrap_err(),
        YabtError::BacklogItemNotFound { .. }
    ));
    assert!(matches!(
        commands::delete(&mut store, "5-A").unwrap_err(),
        YabtError::BacklogItemNotFound { .. }
    ));
    assert!(matches!(
        commands::set_state(&mut store, Some(&homer), "5-A", BacklogItemState::Done).unwrap_err(),
        YabtError::BacklogItemNotFound { .. }
    ));
}
