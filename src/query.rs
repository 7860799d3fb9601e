use rusqlite::types::Value;

use crate::models::TagId;

/// Sort order for the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Oldest events first (ascending by `happened_at`)
    Ascending,
    /// Newest events first (descending by `happened_at`)
    #[default]
    Descending,
}

impl SortOrder {
    fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Filter criteria for the timeline.
///
/// `fetch_page` and `count` on the service compile the same criteria value
/// to the same predicate, so walking pages with increasing offsets until
/// `offset == count` yields the full filtered, sorted result set with no
/// duplicates and no gaps (assuming no intervening writes; no multi-page
/// isolation is provided).
///
/// # Examples
///
/// ```
/// use chronicle::{SortOrder, StoryQuery};
///
/// // Everything from a point in time onward, oldest first
/// let query = StoryQuery {
///     from: Some(1_650_000_000_000),
///     order: SortOrder::Ascending,
///     ..Default::default()
/// };
/// assert!(query.to.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoryQuery {
    /// Inclusive lower bound on `happened_at`, Unix milliseconds.
    pub from: Option<i64>,
    /// Inclusive upper bound on `happened_at`, Unix milliseconds.
    pub to: Option<i64>,
    /// Timeline direction.
    pub order: SortOrder,
    /// Match stories carrying any of these tags. `None` disables the
    /// filter; an empty list matches nothing.
    pub tags: Option<Vec<TagId>>,
}

impl StoryQuery {
    /// Builds the shared WHERE clause and its parameters.
    ///
    /// The tag filter unpacks the `tag_ids` JSON column with `json_each`;
    /// a story matches when any of its ids appears in the filter set.
    fn predicate(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(from) = self.from {
            clauses.push("happened_at >= ?".to_string());
            params.push(Value::Integer(from));
        }
        if let Some(to) = self.to {
            clauses.push("happened_at <= ?".to_string());
            params.push(Value::Integer(to));
        }
        if let Some(tags) = &self.tags {
            if tags.is_empty() {
                // An explicit empty filter matches no stories
                clauses.push("0 = 1".to_string());
            } else {
                let placeholders: Vec<&str> = tags.iter().map(|_| "?").collect();
                clauses.push(format!(
                    "EXISTS (SELECT 1 FROM json_each(stories.tag_ids) \
                     WHERE json_each.value IN ({}))",
                    placeholders.join(", ")
                ));
                params.extend(tags.iter().map(|t| Value::Integer(t.get())));
            }
        }

        if clauses.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", clauses.join(" AND ")), params)
        }
    }

    /// SQL and parameters for one page of matching stories.
    ///
    /// Ordering ties on `happened_at` are broken by id so pagination stays
    /// stable across calls.
    pub(crate) fn page_sql(&self, offset: u64, limit: u64) -> (String, Vec<Value>) {
        let (predicate, mut params) = self.predicate();
        let order = self.order.sql();
        let sql = format!(
            "SELECT id, title, happened_at, detail, tag_ids, color, is_archived, \
             version, create_at, updated_at FROM stories{predicate} \
             ORDER BY happened_at {order}, id {order} LIMIT ? OFFSET ?",
        );
        params.push(Value::Integer(limit as i64));
        params.push(Value::Integer(offset as i64));
        (sql, params)
    }

    /// SQL and parameters for the matching-row count, same predicate as
    /// `page_sql`, ignoring offset/limit.
    pub(crate) fn count_sql(&self) -> (String, Vec<Value>) {
        let (predicate, params) = self.predicate();
        (
            format!("SELECT COUNT(*) FROM stories{predicate}"),
            params,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_has_no_predicate() {
        let (sql, params) = StoryQuery::default().count_sql();
        assert_eq!(sql, "SELECT COUNT(*) FROM stories");
        assert!(params.is_empty());
    }

    #[test]
    fn range_bounds_are_inclusive_and_ordered() {
        let query = StoryQuery {
            from: Some(10),
            to: Some(20),
            ..Default::default()
        };
        let (sql, params) = query.count_sql();
        assert!(sql.contains("happened_at >= ?"));
        assert!(sql.contains("happened_at <= ?"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn page_sql_orders_and_paginates() {
        let query = StoryQuery {
            order: SortOrder::Ascending,
            ..Default::default()
        };
        let (sql, params) = query.page_sql(40, 20);
        assert!(sql.contains("ORDER BY happened_at ASC, id ASC"));
        assert!(sql.ends_with("LIMIT ? OFFSET ?"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn default_order_is_descending() {
        let (sql, _) = StoryQuery::default().page_sql(0, 10);
        assert!(sql.contains("ORDER BY happened_at DESC, id DESC"));
    }

    #[test]
    fn tag_filter_uses_json_each() {
        let query = StoryQuery {
            tags: Some(vec![TagId::new(1), TagId::new(2)]),
            ..Default::default()
        };
        let (sql, params) = query.count_sql();
        assert!(sql.contains("json_each(stories.tag_ids)"));
        assert!(sql.contains("IN (?, ?)"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn empty_tag_filter_matches_nothing() {
        let query = StoryQuery {
            tags: Some(Vec::new()),
            ..Default::default()
        };
        let (sql, params) = query.count_sql();
        assert!(sql.contains("0 = 1"));
        assert!(params.is_empty());
    }

    #[test]
    fn page_and_count_share_the_predicate() {
        let query = StoryQuery {
            from: Some(5),
            tags: Some(vec![TagId::new(3)]),
            ..Default::default()
        };
        let (page_sql, _) = query.page_sql(0, 10);
        let (count_sql, _) = query.count_sql();
        let predicate = count_sql
            .strip_prefix("SELECT COUNT(*) FROM stories")
            .unwrap();
        assert!(page_sql.contains(predicate));
    }
}
