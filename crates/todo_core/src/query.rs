//! Remote list query construction.
//!
//! The encoded URL doubles as the read path's change-detection key, so
//! everything here is a pure function of its inputs.

use shared::domain::{SortDirection, SortField};
use url::Url;

pub const SORT_FIELD_PARAM: &str = "sort[0][field]";
pub const SORT_DIRECTION_PARAM: &str = "sort[0][direction]";
pub const FILTER_PARAM: &str = "filterByFormula";

/// View parameters that select which records the store returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub query_string: String,
}

impl ListQuery {
    pub fn new(
        sort_field: SortField,
        sort_direction: SortDirection,
        query_string: impl Into<String>,
    ) -> Self {
        Self {
            sort_field,
            sort_direction,
            query_string: query_string.into(),
        }
    }

    pub fn encode(&self, base_url: &Url) -> Url {
        encode(
            self.sort_field,
            self.sort_direction,
            &self.query_string,
            base_url,
        )
    }
}

pub fn encode(
    sort_field: SortField,
    sort_direction: SortDirection,
    query_string: &str,
    base_url: &Url,
) -> Url {
    let mut url = base_url.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair(SORT_FIELD_PARAM, sort_field.as_str());
        pairs.append_pair(SORT_DIRECTION_PARAM, sort_direction.as_str());
        if !query_string.is_empty() {
            pairs.append_pair(FILTER_PARAM, &search_formula(query_string));
        }
    }
    url
}

/// `SEARCH("<needle>", title)` with the needle escaped as a formula string literal.
pub fn search_formula(query_string: &str) -> String {
    format!("SEARCH(\"{}\", title)", escape_formula_string(query_string))
}

fn escape_formula_string(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
