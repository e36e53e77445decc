use crate::config::PagerConfig;
use crate::cursor::{self, Cursor};

/// Href given to pages whose cursor is not known yet. Clicks on it are
/// ignored until the ledger has been fetched.
pub const PENDING_HREF: &str = "#fetching";

fn encoded_query(config: &PagerConfig) -> Option<String> {
    config.query().map(cursor::encode_component)
}

pub fn first_page_url(config: &PagerConfig, page_size: usize) -> String {
    let home = config.home_url.as_str();
    if let Some(label) = config.label() {
        return format!("{home}/search/label/{label}?max-results={page_size}");
    }
    if let Some(query) = encoded_query(config) {
        return format!(
            "{home}/search?q={query}&max-results={page_size}&by-date={}",
            config.by_date
        );
    }
    home.to_string()
}

fn base_path(config: &PagerConfig) -> String {
    if let Some(label) = config.label() {
        return format!("/search/label/{label}?");
    }
    if let Some(query) = encoded_query(config) {
        return format!("/search?q={query}&");
    }
    "/search?".to_string()
}

/// Navigable URL for `page`, or [`PENDING_HREF`] when the ledger does not
/// reach that far.
pub fn build_page_link(config: &PagerConfig, page: usize, post_dates: &[String], page_size: usize) -> String {
    if page <= 1 {
        return first_page_url(config, page_size);
    }

    let updated_max = match cursor::page_to_cursor(page, post_dates, page_size) {
        Cursor::Known(c) => c,
        Cursor::Pending => return PENDING_HREF.to_string(),
    };

    format!(
        "{}{}updated-max={}&max-results={}&start={}&by-date={}",
        config.home_url,
        base_path(config),
        updated_max,
        page_size,
        (page - 1) * page_size,
        config.by_date
    )
}
