#![allow(dead_code)]

use yabt::model::{BacklogItemType, CustomFieldType};
use yabt::services::backlog_items::{BacklogItemAddUpdRequest, BacklogItemGetResponse, commands};
use yabt::services::custom_fields::{self, CustomFieldAddRequest};
use yabt::services::users::{self, UserAddUpdRequest};
use yabt::storage::DocumentStore;

pub fn user_request(first: &str, last: &str) -> UserAddUpdRequest {
    UserAddUpdRequest {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}.{}@springfield.test", first.to_lowercase(), last.to_lowercase()),
        avatar_url: None,
    }
}

/// Create a user and return its short id.
pub fn add_user(store: &mut DocumentStore, first: &str, last: &str) -> String {
    users::create(store, &user_request(first, last))
        .expect("create user")
        .id
}

/// Homer, Marge and Bart, in that order (`1-A`, `2-A`, `3-A`).
pub fn seed_users(store: &mut DocumentStore) -> (String, String, String) {
    (
        add_user(store, "Homer", "Simpson"),
        add_user(store, "Marge", "Simpson"),
        add_user(store, "Bart", "Simpson"),
    )
}

pub fn item_request(title: &str) -> BacklogItemAddUpdRequest {
    BacklogItemAddUpdRequest {
        title: title.to_string(),
        ..BacklogItemAddUpdRequest::default()
    }
}

pub fn add_item(
    store: &mut DocumentStore,
    actor: &str,
    item_type: BacklogItemType,
    request: &BacklogItemAddUpdRequest,
) -> BacklogItemGetResponse {
    commands::create(store, Some(actor), item_type, request).expect("create item")
}

pub fn add_task(store: &mut DocumentStore, actor: &str, title: &str) -> String {
    add_item(store, actor, BacklogItemType::Task, &item_request(title)).id
}

pub fn add_field(store: &mut DocumentStore, name: &str, field_type: CustomFieldType) -> String {
    custom_fields::create(
        store,
        &CustomFieldAddRequest {
            name: name.to_string(),
            field_type,
            is_mandatory: false,
            backlog_item_types: vec![],
        },
    )
    .expect("create field")
    .id
}
