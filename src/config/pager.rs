//! Render configuration and the layers it is resolved from.
//!
//! Resolution order is defaults, then constructor options, then values read
//! from the hosting page URL, then element attributes. Later layers win.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PagerConfig {
    pub entries_selector: String,
    pub entry_selector: String,
    pub pager_selector: String,
    pub number_selector: String,
    pub number_class: String,
    pub dots_class: String,
    pub active_class: String,
    pub total_visible_numbers: usize,
    /// Sort flag echoed back into links; `"false"` sorts search results by
    /// relevance.
    pub by_date: String,
    pub max_results: Option<usize>,
    pub query: Option<String>,
    pub label: Option<String>,
    pub start: Option<usize>,
    pub updated_max: Option<String>,
    pub home_url: String,
    pub check_for_updates: bool,
    pub enable_interactive_ellipsis: bool,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            entries_selector: ".blog-entries".to_string(),
            entry_selector: ".entry".to_string(),
            pager_selector: ".blog-pager".to_string(),
            number_selector: ".pagination-numbers".to_string(),
            number_class: "pagination-item".to_string(),
            dots_class: "pagination-dots".to_string(),
            active_class: "is-active".to_string(),
            total_visible_numbers: 5,
            by_date: "false".to_string(),
            max_results: None,
            query: None,
            label: None,
            start: None,
            updated_max: None,
            home_url: String::new(),
            check_for_updates: false,
            enable_interactive_ellipsis: false,
        }
    }
}

/// Constructor options. Every field is optional and only overrides the
/// default when set.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagerOptions {
    pub entries_selector: Option<String>,
    pub entry_selector: Option<String>,
    pub pager_selector: Option<String>,
    pub number_selector: Option<String>,
    pub number_class: Option<String>,
    pub dots_class: Option<String>,
    pub active_class: Option<String>,
    pub total_visible_numbers: Option<usize>,
    pub by_date: Option<String>,
    pub max_results: Option<usize>,
    pub query: Option<String>,
    pub label: Option<String>,
    pub check_for_updates: Option<bool>,
    pub enable_interactive_ellipsis: Option<bool>,
}

/// Values taken from the hosting page URL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UrlParams {
    pub home_url: String,
    pub max_results: Option<usize>,
    pub by_date: Option<String>,
    pub updated_max: Option<String>,
    pub start: Option<usize>,
    pub query: Option<String>,
    pub label: Option<String>,
}

impl UrlParams {
    pub fn from_url(url: &Url) -> Self {
        let mut params = UrlParams {
            home_url: url.origin().ascii_serialization(),
            ..UrlParams::default()
        };

        for (key, value) in url.query_pairs() {
            let value = value.into_owned();
            match key.as_ref() {
                "max-results" => params.max_results = parse_count("max-results", &value),
                "by-date" => params.by_date = Some(value),
                "updated-max" => params.updated_max = Some(value),
                "start" => params.start = parse_count("start", &value),
                "q" => params.query = Some(value),
                _ => {}
            }
        }

        params.label = label_from_path(url.path());
        params
    }
}

fn parse_count(key: &str, value: &str) -> Option<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("ignoring non-numeric {key} '{value}' in page URL");
            None
        }
    }
}

fn label_from_path(path: &str) -> Option<String> {
    if !path.contains("/search/label/") {
        return None;
    }
    path.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalizes a raw attribute string: `"true"`/`"false"` become booleans,
/// `"null"` becomes null, numeric strings become numbers.
pub fn normalize_attribute(raw: &str) -> Value {
    let trimmed = raw.trim();
    match trimmed {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Ok(n) = trimmed.parse::<u64>() {
        return Value::from(n);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    Value::String(raw.to_string())
}

fn to_camel_case(key: &str) -> String {
    let key = key.strip_prefix("data-").unwrap_or(key);
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '-' {
            upper_next = true;
            continue;
        }
        if upper_next && c.is_ascii_lowercase() {
            out.push(c.to_ascii_uppercase());
        } else {
            if upper_next {
                out.push('-');
            }
            out.push(c);
        }
        upper_next = false;
    }
    out
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn value_as_count(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|n| usize::try_from(n).ok())
}

impl PagerConfig {
    pub fn resolve(options: &PagerOptions, page_url: &Url, attributes: &HashMap<String, String>) -> Self {
        let mut config = PagerConfig::default();
        config.apply_options(options);
        config.apply_url(&UrlParams::from_url(page_url));
        config.apply_attributes(attributes);
        debug!(
            "resolved pager config: home={} label={:?} query={:?} max_results={:?}",
            config.home_url, config.label, config.query, config.max_results
        );
        config
    }

    pub fn apply_options(&mut self, options: &PagerOptions) {
        let PagerOptions {
            entries_selector,
            entry_selector,
            pager_selector,
            number_selector,
            number_class,
            dots_class,
            active_class,
            total_visible_numbers,
            by_date,
            max_results,
            query,
            label,
            check_for_updates,
            enable_interactive_ellipsis,
        } = options.clone();

        if let Some(v) = entries_selector {
            self.entries_selector = v;
        }
        if let Some(v) = entry_selector {
            self.entry_selector = v;
        }
        if let Some(v) = pager_selector {
            self.pager_selector = v;
        }
        if let Some(v) = number_selector {
            self.number_selector = v;
        }
        if let Some(v) = number_class {
            self.number_class = v;
        }
        if let Some(v) = dots_class {
            self.dots_class = v;
        }
        if let Some(v) = active_class {
            self.active_class = v;
        }
        if let Some(v) = total_visible_numbers {
            self.total_visible_numbers = v;
        }
        if let Some(v) = by_date {
            self.by_date = v;
        }
        if max_results.is_some() {
            self.max_results = max_results;
        }
        if query.is_some() {
            self.query = query;
        }
        if label.is_some() {
            self.label = label;
        }
        if let Some(v) = check_for_updates {
            self.check_for_updates = v;
        }
        if let Some(v) = enable_interactive_ellipsis {
            self.enable_interactive_ellipsis = v;
        }
    }

    pub fn apply_url(&mut self, params: &UrlParams) {
        self.home_url = params.home_url.clone();
        if params.max_results.is_some() {
            self.max_results = params.max_results;
        }
        if let Some(v) = params.by_date.as_ref() {
            self.by_date = v.clone();
        }
        if params.updated_max.is_some() {
            self.updated_max = params.updated_max.clone();
        }
        if params.start.is_some() {
            self.start = params.start;
        }
        if params.query.is_some() {
            self.query = params.query.clone();
        }
        if params.label.is_some() {
            self.label = params.label.clone();
        }
    }

    /// Applies element attributes (`data-max-results`, `totalVisibleNumbers`,
    /// ...). Unknown keys and values of the wrong shape are skipped.
    pub fn apply_attributes(&mut self, attributes: &HashMap<String, String>) {
        for (raw_key, raw_value) in attributes {
            let key = to_camel_case(raw_key);
            let value = normalize_attribute(raw_value);
            let applied = self.apply_attribute(&key, &value);
            if !applied {
                warn!("ignoring pager attribute {raw_key}={raw_value}");
            }
        }
    }

    fn apply_attribute(&mut self, key: &str, value: &Value) -> bool {
        match key {
            "entriesSelector" => set_string(&mut self.entries_selector, value),
            "entrySelector" => set_string(&mut self.entry_selector, value),
            "pagerSelector" => set_string(&mut self.pager_selector, value),
            "numberSelector" => set_string(&mut self.number_selector, value),
            "numberClass" => set_string(&mut self.number_class, value),
            "dotsClass" => set_string(&mut self.dots_class, value),
            "activeClass" => set_string(&mut self.active_class, value),
            "byDate" => set_string(&mut self.by_date, value),
            "totalVisibleNumbers" => match value_as_count(value) {
                Some(n) if n > 0 => {
                    self.total_visible_numbers = n;
                    true
                }
                _ => false,
            },
            "maxResults" => match value {
                Value::Null => {
                    self.max_results = None;
                    true
                }
                v => match value_as_count(v) {
                    Some(n) => {
                        self.max_results = Some(n);
                        true
                    }
                    None => false,
                },
            },
            "query" => {
                self.query = value_as_string(value);
                true
            }
            "label" => {
                self.label = value_as_string(value);
                true
            }
            "checkForUpdates" => set_bool(&mut self.check_for_updates, value),
            "enableInteractiveEllipsis" => set_bool(&mut self.enable_interactive_ellipsis, value),
            _ => false,
        }
    }

    /// Posts per page: an explicit `max_results`, else the number of entries
    /// rendered on the page.
    pub fn page_size(&self, entries_on_page: Option<usize>) -> Option<usize> {
        self.max_results
            .filter(|n| *n > 0)
            .or(entries_on_page.filter(|n| *n > 0))
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.is_empty())
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref().filter(|l| !l.is_empty())
    }
}

fn set_string(slot: &mut String, value: &Value) -> bool {
    match value_as_string(value) {
        Some(s) => {
            *slot = s;
            true
        }
        None => false,
    }
}

fn set_bool(slot: &mut bool, value: &Value) -> bool {
    match value {
        Value::Bool(b) => {
            *slot = *b;
            true
        }
        _ => false,
    }
}
