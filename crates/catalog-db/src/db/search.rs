//! Helpers shared by the paginated search queries

use catalog_core::models::{SearchInput, SearchOutput};

/// `ORDER BY` clause for a search; unknown `order_by` values fall back to
/// `default_column` so user input never reaches the SQL text.
pub(crate) fn order_clause(input: &SearchInput, allowed: &[&'static str], default_column: &'static str) -> String {
    let requested = input.order_by.trim().to_lowercase();
    let column = allowed
        .iter()
        .copied()
        .find(|column| *column == requested)
        .unwrap_or(default_column);
    format!("ORDER BY {} {}, id ASC", column, input.order.as_sql())
}

/// `ILIKE` pattern for the search term, with wildcards in the term escaped.
pub(crate) fn like_pattern(input: &SearchInput) -> Option<String> {
    input.search_term().map(|term| {
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

pub(crate) fn page<T>(input: &SearchInput, total: i64, items: Vec<T>) -> SearchOutput<T> {
    SearchOutput {
        current_page: input.page(),
        per_page: input.per_page(),
        total: u64::try_from(total).unwrap_or(0),
        items,
    }
}
