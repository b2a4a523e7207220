//! The `BacklogItems/ForList` index.
//!
//! Maintained synchronously whenever a backlog item is stored or deleted.
//! Single-valued fields live in `backlog_items_for_list`; multi-valued
//! terms (modifiers, tags, related items, custom fields) live in
//! `backlog_items_for_list_terms`. All user and item ids are stored in
//! normalized form (short, lowercase).

use crate::error::Result;
use crate::model::{BacklogItem, BacklogItemState, BacklogItemType};
use crate::storage::patch::IndexPredicate;
use crate::util::id::{id_for_dynamic_field, normalize_id, parse_sequence};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write as _;

const TERM_MODIFIED_BY: &str = "modifiedBy";
const TERM_TAG: &str = "tag";
const TERM_RELATED: &str = "related";
const TERM_CUSTOM_FIELD: &str = "customField";

/// How the current user relates to the listed items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserRelation {
    Assigned,
    Created,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderBy {
    /// Most recently updated first.
    #[default]
    Default,
    Number,
    Title,
    Assignee,
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filter, ordering and window of a list query.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Substring of the title, or an item number.
    pub search: Option<String>,
    pub item_types: Vec<BacklogItemType>,
    pub states: Vec<BacklogItemState>,
    /// Every tag must be present.
    pub tags: Vec<String>,
    pub assigned_user_id: Option<String>,
    /// Relation of `(relation, user_id)`.
    pub user_relation: Option<(UserRelation, String)>,
    pub order_by: OrderBy,
    pub direction: OrderDirection,
    pub offset: usize,
    pub limit: usize,
}

/// Matching item ids for one page plus the total match count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub ids: Vec<String>,
    pub total: usize,
}

/// A tag and the number of items carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub name: String,
    pub count: usize,
}

fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn user_term(id: &str) -> String {
    normalize_id(&id_for_dynamic_field(id))
}

/// Write (or rewrite) the index entries of an item.
///
/// # Errors
///
/// Returns an error if a write fails.
pub fn reindex(conn: &Connection, item: &BacklogItem) -> Result<()> {
    let assignee_id = item
        .assignee
        .as_ref()
        .and_then(|a| a.id.as_deref())
        .map(user_term);
    let created = item.created();
    let updated = item.last_updated();

    conn.execute(
        "INSERT OR REPLACE INTO backlog_items_for_list
            (id, number, title, title_lower, item_type, state,
             assigned_user_id, assignee_name, created_by_user_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        rusqlite::params![
            item.id,
            parse_sequence(&item.id).unwrap_or_default(),
            item.title,
            item.title.to_lowercase(),
            item.item_type().as_str(),
            item.state.as_str(),
            assignee_id,
            item.assignee.as_ref().map(|a| a.name.clone()),
            created.and_then(|r| r.change.actioned_by.id.as_deref().map(user_term)),
            created.map(|r| timestamp(&r.change.timestamp)),
            updated.map(|r| timestamp(&r.change.timestamp)),
        ],
    )?;

    conn.execute(
        "DELETE FROM backlog_items_for_list_terms WHERE item_id = ?",
        [&item.id],
    )?;

    let mut terms: BTreeSet<(&str, String)> = BTreeSet::new();
    let modifiers = item
        .modified_by
        .iter()
        .map(|r| &r.change.actioned_by)
        .chain(item.comments.iter().map(|c| &c.author));
    for reference in modifiers {
        if let Some(id) = reference.id.as_deref().filter(|id| !id.is_empty()) {
            terms.insert((TERM_MODIFIED_BY, user_term(id)));
        }
    }
    for tag in &item.tags {
        terms.insert((TERM_TAG, tag.clone()));
    }
    for relation in &item.related_items {
        terms.insert((TERM_RELATED, normalize_id(&relation.related_to.id)));
    }
    for field_id in item.custom_fields.keys() {
        terms.insert((TERM_CUSTOM_FIELD, normalize_id(field_id)));
    }

    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO backlog_items_for_list_terms (item_id, field, term) VALUES (?, ?, ?)",
    )?;
    for (field, term) in &terms {
        stmt.execute(rusqlite::params![item.id, field, term])?;
    }
    Ok(())
}

/// Drop the index entries of a deleted item.
///
/// # Errors
///
/// Returns an error if a delete fails.
pub fn remove(conn: &Connection, item_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM backlog_items_for_list_terms WHERE item_id = ?",
        [item_id],
    )?;
    conn.execute("DELETE FROM backlog_items_for_list WHERE id = ?", [item_id])?;
    Ok(())
}

/// Full ids of the items matching a patch predicate.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn query_ids(conn: &Connection, predicate: &IndexPredicate) -> Result<Vec<String>> {
    let (sql, param) = match predicate {
        IndexPredicate::TouchedByUser(user_id) => (
            "SELECT item_id FROM backlog_items_for_list_terms WHERE field = 'modifiedBy' AND term = ?1
             UNION
             SELECT id FROM backlog_items_for_list WHERE assigned_user_id = ?1",
            user_term(user_id),
        ),
        IndexPredicate::RelatedTo(item_id) => (
            "SELECT item_id FROM backlog_items_for_list_terms WHERE field = 'related' AND term = ?1",
            normalize_id(item_id),
        ),
        IndexPredicate::HasCustomField(field_id) => (
            "SELECT item_id FROM backlog_items_for_list_terms WHERE field = 'customField' AND term = ?1",
            normalize_id(field_id),
        ),
    };

    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([param], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// Run a list query against the index.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list(conn: &Connection, filter: &ListFilter) -> Result<ListPage> {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        match parse_sequence(search) {
            Some(number) => {
                where_sql.push_str(" AND (number = ? OR title_lower LIKE ? ESCAPE '\\')");
                params.push(Box::new(number));
            }
            None => where_sql.push_str(" AND title_lower LIKE ? ESCAPE '\\'"),
        }
        params.push(Box::new(format!("%{}%", escape_like(&search.to_lowercase()))));
    }

    if !filter.item_types.is_empty() {
        let placeholders: Vec<&str> = filter.item_types.iter().map(|_| "?").collect();
        let _ = write!(where_sql, " AND item_type IN ({})", placeholders.join(","));
        for t in &filter.item_types {
            params.push(Box::new(t.as_str()));
        }
    }

    if !filter.states.is_empty() {
        let placeholders: Vec<&str> = filter.states.iter().map(|_| "?").collect();
        let _ = write!(where_sql, " AND state IN ({})", placeholders.join(","));
        for s in &filter.states {
            params.push(Box::new(s.as_str()));
        }
    }

    for tag in &filter.tags {
        where_sql.push_str(
            " AND EXISTS (SELECT 1 FROM backlog_items_for_list_terms t
                          WHERE t.item_id = i.id AND t.field = 'tag' AND t.term = ?)",
        );
        params.push(Box::new(tag.trim().to_string()));
    }

    if let Some(user_id) = &filter.assigned_user_id {
        where_sql.push_str(" AND assigned_user_id = ?");
        params.push(Box::new(user_term(user_id)));
    }

    if let Some((relation, user_id)) = &filter.user_relation {
        match relation {
            UserRelation::Assigned => where_sql.push_str(" AND assigned_user_id = ?"),
            UserRelation::Created => where_sql.push_str(" AND created_by_user_id = ?"),
            UserRelation::Modified => where_sql.push_str(
                " AND EXISTS (SELECT 1 FROM backlog_items_for_list_terms t
                              WHERE t.item_id = i.id AND t.field = 'modifiedBy' AND t.term = ?)",
            ),
        }
        params.push(Box::new(user_term(user_id)));
    }

    let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM backlog_items_for_list i{where_sql}"),
        params_refs.as_slice(),
        |row| row.get(0),
    )?;

    let order = filter.direction.as_sql();
    let order_sql = match filter.order_by {
        OrderBy::Default => "updated_at DESC, number DESC".to_string(),
        OrderBy::Number => format!("number {order}"),
        OrderBy::Title => format!("title_lower {order}, number DESC"),
        OrderBy::Assignee => format!(
            "assignee_name IS NULL, assignee_name COLLATE NOCASE {order}, number DESC"
        ),
        OrderBy::Created => format!("created_at {order}, number {order}"),
        OrderBy::Updated => format!("updated_at {order}, number {order}"),
    };

    let limit = i64::try_from(filter.limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(filter.offset).unwrap_or(i64::MAX);
    let mut page_params = params_refs;
    page_params.push(&limit);
    page_params.push(&offset);

    let sql = format!(
        "SELECT id FROM backlog_items_for_list i{where_sql} ORDER BY {order_sql} LIMIT ? OFFSET ?"
    );
    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map(page_params.as_slice(), |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ListPage {
        ids,
        total: usize::try_from(total).unwrap_or_default(),
    })
}

/// Tags in use, most common first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn tag_counts(conn: &Connection, search: Option<&str>, limit: usize) -> Result<Vec<TagCount>> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| "%".to_string(), |s| format!("%{}%", escape_like(s)));

    let mut stmt = conn.prepare(
        r"SELECT MIN(term), COUNT(*) AS count
          FROM backlog_items_for_list_terms
          WHERE field = 'tag' AND term LIKE ? ESCAPE '\'
          GROUP BY term
          ORDER BY count DESC, MIN(term) COLLATE NOCASE
          LIMIT ?",
    )?;
    let tags = stmt
        .query_map(
            rusqlite::params![pattern, i64::try_from(limit).unwrap_or(i64::MAX)],
            |row| {
                Ok(TagCount {
                    name: row.get(0)?,
                    count: usize::try_from(row.get::<_, i64>(1)?).unwrap_or_default(),
                })
            },
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(tags)
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BacklogItemDetails, DescriptionDetails, UserReference};
    use crate::storage::schema::apply_schema;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        apply_schema(&conn).unwrap();
        conn
    }

    fn user(id: &str) -> UserReference {
        UserReference {
            id: Some(id.to_string()),
            name: format!("User {id}"),
            full_name: format!("User {id}"),
        }
    }

    fn item(id: &str, title: &str) -> BacklogItem {
        let mut item = BacklogItem::new(title, BacklogItemDetails::Task(DescriptionDetails::default()));
        item.id = id.to_string();
        item.add_history_record(&user("1-A"), "Created");
        item
    }

    #[test]
    fn touched_by_user_matches_modifiers_and_assignee() {
        let conn = conn();
        let mut a = item("BacklogItems/1-A", "Modified by 2");
        a.add_history_record(&user("2-A"), "Updated");
        let mut b = item("BacklogItems/2-A", "Assigned to 2");
        b.assignee = Some(user("2-a"));
        let c = item("BacklogItems/3-A", "Untouched");
        for i in [&a, &b, &c] {
            reindex(&conn, i).unwrap();
        }

        let mut ids = query_ids(&conn, &IndexPredicate::TouchedByUser("Users/2-A".into())).unwrap();
        ids.sort();
        assert_eq!(ids, vec!["BacklogItems/1-A", "BacklogItems/2-A"]);
    }

    #[test]
    fn remove_drops_all_entries() {
        let conn = conn();
        let mut a = item("BacklogItems/1-A", "Tagged");
        a.tags = vec!["ui".into()];
        reindex(&conn, &a).unwrap();
        remove(&conn, &a.id).unwrap();

        assert!(tag_counts(&conn, None, 10).unwrap().is_empty());
        assert_eq!(list(&conn, &ListFilter { limit: 10, ..ListFilter::default() }).unwrap().total, 0);
    }

    #[test]
    fn search_matches_title_or_number() {
        let conn = conn();
        reindex(&conn, &item("BacklogItems/1-A", "Login fails")).unwrap();
        reindex(&conn, &item("BacklogItems/2-A", "Dark mode")).unwrap();

        let by_title = list(
            &conn,
            &ListFilter {
                search: Some("LOGIN".into()),
                limit: 10,
                ..ListFilter::default()
            },
        )
        .unwrap();
        assert_eq!(by_title.ids, vec!["BacklogItems/1-A"]);

        let by_number = list(
            &conn,
            &ListFilter {
                search: Some("2".into()),
                limit: 10,
                ..ListFilter::default()
            },
        )
        .unwrap();
        assert_eq!(by_number.ids, vec!["BacklogItems/2-A"]);
    }

    #[test]
    fn like_wildcards_are_literal() {
        let conn = conn();
        reindex(&conn, &item("BacklogItems/1-A", "100% done")).unwrap();
        reindex(&conn, &item("BacklogItems/2-A", "1000 rows")).unwrap();

        let page = list(
            &conn,
            &ListFilter {
                search: Some("0%".into()),
                limit: 10,
                ..ListFilter::default()
            },
        )
        .unwrap();
        assert_eq!(page.ids, vec!["BacklogItems/1-A"]);
    }

    #[test]
    fn tag_counts_group_case_insensitively() {
        let conn = conn();
        let mut a = item("BacklogItems/1-A", "a");
        a.tags = vec!["UI".into(), "backend".into()];
        let mut b = item("BacklogItems/2-A", "b");
        b.tags = vec!["ui".into()];
        reindex(&conn, &a).unwrap();
        reindex(&conn, &b).unwrap();

        let tags = tag_counts(&conn, None, 10).unwrap();
        assert_eq!(tags[0].count, 2);
        assert!(tags[0].name.eq_ignore_ascii_case("ui"));
        assert_eq!(tags[1], TagCount { name: "backend".into(), count: 1 });

        assert_eq!(tag_counts(&conn, Some("back"), 10).unwrap().len(), 1);
        assert_eq!(tag_counts(&conn, None, 1).unwrap().len(), 1);
    }
}
