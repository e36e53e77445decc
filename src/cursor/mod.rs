//! Mapping between page numbers and the feed's `updated-max` cursor.
//!
//! The feed paginates by timestamp rather than by offset: page `n` starts
//! right after the post at index `(n - 1) * page_size - 1` of the ledger.

use crate::config::PagerConfig;

/// Result of looking a page up in the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cursor {
    /// Percent-encoded boundary timestamp, ready to go into a query string.
    Known(String),
    /// The ledger does not reach this page yet.
    Pending,
}

/// Every `page_size`-th timestamp of the ledger; entry `i` is the cutoff
/// into page `i + 2`.
pub fn boundary_ledger(post_dates: &[String], page_size: usize) -> Vec<&str> {
    if page_size == 0 {
        return Vec::new();
    }
    post_dates
        .iter()
        .skip(page_size - 1)
        .step_by(page_size)
        .map(String::as_str)
        .collect()
}

/// Works out which page the hosting URL points at.
///
/// A numeric `start` offset wins in search mode; otherwise the `updated-max`
/// cursor is looked up in the boundary ledger. Anything unresolvable is
/// page 1.
pub fn resolve_current_page(config: &PagerConfig, post_dates: &[String], page_size: usize) -> usize {
    if config.updated_max.is_none() && config.start.is_none() {
        return 1;
    }
    if page_size == 0 {
        return 1;
    }

    if let (Some(_), Some(start)) = (config.query(), config.start) {
        return start.div_ceil(page_size).saturating_add(1);
    }

    let Some(updated_max) = config.updated_max.as_deref() else {
        return 1;
    };
    boundary_ledger(post_dates, page_size)
        .iter()
        .position(|d| *d == updated_max)
        .map(|i| i + 2)
        .unwrap_or(1)
}

/// Boundary cursor that opens `page`. Page 1 has no cursor and is always
/// `Pending`; callers link it canonically instead.
pub fn page_to_cursor(page: usize, post_dates: &[String], page_size: usize) -> Cursor {
    let Some(index) = page.saturating_sub(1).saturating_mul(page_size).checked_sub(1) else {
        return Cursor::Pending;
    };
    match post_dates.get(index) {
        Some(date) if !date.is_empty() => Cursor::Known(encode_component(date)),
        _ => Cursor::Pending,
    }
}

pub(crate) fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
