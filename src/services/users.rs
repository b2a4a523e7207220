//! User commands and queries.

use crate::error::{Result, ValidationError, YabtError};
use crate::model::User;
use crate::services::user_references;
use crate::services::{ListResponse, PagingLimits};
use crate::storage::{DocumentRead, DocumentStore, OrderDirection};
use crate::util::id::{normalize_id, short_id};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Body of a user create or update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAddUpdRequest {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserOrderBy {
    #[default]
    Name,
    Email,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListGetRequest {
    pub search: Option<String>,
    pub order_by: Option<UserOrderBy>,
    pub order_direction: Option<OrderDirection>,
    pub page_index: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGetByIdResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub name_with_initials: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListGetResponse {
    pub id: String,
    pub name_with_initials: String,
    pub full_name: String,
    pub email: String,
}

impl From<&User> for UserGetByIdResponse {
    fn from(user: &User) -> Self {
        Self {
            id: short_id(&user.id).to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            name_with_initials: user.name_with_initials(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

impl From<&User> for UserListGetResponse {
    fn from(user: &User) -> Self {
        Self {
            id: short_id(&user.id).to_string(),
            name_with_initials: user.name_with_initials(),
            full_name: user.full_name(),
            email: user.email.clone(),
        }
    }
}

fn validate(reader: &impl DocumentRead, request: &UserAddUpdRequest, self_id: Option<&str>) -> Result<()> {
    let mut errors = Vec::new();

    if request.first_name.trim().is_empty() {
        errors.push(ValidationError::new("firstName", "cannot be empty"));
    }

    let email = request.email.trim();
    if !email.contains('@') {
        errors.push(ValidationError::new("email", "must contain '@'"));
    } else {
        let taken = reader.query_all::<User>()?.iter().any(|other| {
            other.email.trim().eq_ignore_ascii_case(email)
                && self_id.is_none_or(|id| normalize_id(id) != normalize_id(&other.id))
        });
        if taken {
            errors.push(ValidationError::new("email", "is already in use"));
        }
    }

    let bad_avatar = request
        .avatar_url
        .as_deref()
        .map(str::trim)
        .is_some_and(|u| !u.is_empty() && !(u.starts_with("http://") || u.starts_with("https://")));
    if bad_avatar {
        errors.push(ValidationError::new("avatarUrl", "expected an http(s) URL"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(YabtError::from_validation_errors(errors))
    }
}

fn apply(user: &mut User, request: &UserAddUpdRequest) {
    user.first_name = request.first_name.trim().to_string();
    user.last_name = request.last_name.trim().to_string();
    user.email = request.email.trim().to_string();
    user.avatar_url = request
        .avatar_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);
}

/// Create a user.
///
/// # Errors
///
/// Returns a validation error for a blank first name or a bad or taken email.
pub fn create(store: &mut DocumentStore, request: &UserAddUpdRequest) -> Result<UserGetByIdResponse> {
    let user = store.mutate("create_user", |session| {
        validate(session, request, None)?;
        let mut user = User {
            id: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            avatar_url: None,
        };
        apply(&mut user, request);
        session.store(&mut user)?;
        Ok(user)
    })?;
    info!(id = %user.id, "Created user");
    Ok(UserGetByIdResponse::from(&user))
}

/// Update a user and re-publish its references when the display names change.
///
/// # Errors
///
/// Returns `UserNotFound` or a validation error.
pub fn update(
    store: &mut DocumentStore,
    user_id: &str,
    request: &UserAddUpdRequest,
) -> Result<UserGetByIdResponse> {
    let user = store.mutate("update_user", |session| {
        let mut user = session
            .load::<User>(user_id)?
            .ok_or_else(|| YabtError::UserNotFound {
                id: user_id.to_string(),
            })?;
        validate(session, request, Some(&user.id))?;

        let before = user.reference();
        apply(&mut user, request);
        session.store(&mut user)?;

        let after = user.reference();
        if after != before {
            user_references::update_references(session, &after);
        }
        Ok(user)
    })?;
    info!(id = %user.id, "Updated user");
    Ok(UserGetByIdResponse::from(&user))
}

/// Delete a user and detach it from every backlog item.
///
/// Returns the deleted user's short id.
///
/// # Errors
///
/// Returns `UserNotFound` when there is no such user.
pub fn delete(store: &mut DocumentStore, user_id: &str) -> Result<String> {
    let id = store.mutate("delete_user", |session| {
        let user = session
            .load::<User>(user_id)?
            .ok_or_else(|| YabtError::UserNotFound {
                id: user_id.to_string(),
            })?;
        session.delete::<User>(&user.id)?;
        user_references::clear_user_id(session, &user.id);
        Ok(short_id(&user.id).to_string())
    })?;
    info!(id = %id, "Deleted user");
    Ok(id)
}

/// # Errors
///
/// Returns `UserNotFound` when there is no such user.
pub fn get(reader: &impl DocumentRead, user_id: &str) -> Result<UserGetByIdResponse> {
    reader
        .load::<User>(user_id)?
        .map(|user| UserGetByIdResponse::from(&user))
        .ok_or_else(|| YabtError::UserNotFound {
            id: user_id.to_string(),
        })
}

/// Search, order and page users.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn list(
    reader: &impl DocumentRead,
    request: &UserListGetRequest,
    limits: &PagingLimits,
) -> Result<ListResponse<UserListGetResponse>> {
    let search = request
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut users: Vec<User> = reader
        .query_all::<User>()?
        .into_iter()
        .filter(|user| {
            search.as_deref().is_none_or(|needle| {
                user.full_name().to_lowercase().contains(needle)
                    || user.email.to_lowercase().contains(needle)
            })
        })
        .collect();

    match request.order_by.unwrap_or_default() {
        UserOrderBy::Name => users.sort_by_cached_key(|u| {
            (u.last_name.to_lowercase(), u.first_name.to_lowercase())
        }),
        UserOrderBy::Email => users.sort_by_cached_key(|u| u.email.to_lowercase()),
    }
    if request.order_direction == Some(OrderDirection::Desc) {
        users.reverse();
    }

    let (page_index, page_size) = limits.resolve(request.page_index, request.page_size);
    let entries: Vec<UserListGetResponse> = users.iter().map(UserListGetResponse::from).collect();
    Ok(ListResponse::from_all(entries, page_index, page_size))
}
