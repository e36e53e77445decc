use serde::Serialize;

use crate::config::PagerConfig;
use crate::links;
use crate::model::{EntryKind, PageEntry};

/// Description of one element of the number strip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum Node {
    /// `<a class href>n</a>`
    Link {
        class: String,
        text: String,
        href: String,
    },
    /// Decorative `<span class>...</span>`.
    Dots { class: String },
    /// Clickable ellipsis; activating it re-renders around `target`.
    Jump { class: String, target: usize },
}

pub fn render_nodes(
    config: &PagerConfig,
    entries: &[PageEntry],
    post_dates: &[String],
    page_size: usize,
) -> Vec<Node> {
    entries
        .iter()
        .filter_map(|entry| match (entry.kind, entry.value) {
            (EntryKind::Number, Some(page)) => {
                let active = if entry.is_active {
                    config.active_class.as_str()
                } else {
                    ""
                };
                Some(Node::Link {
                    class: format!("{} {}", config.number_class, active).trim().to_string(),
                    text: page.to_string(),
                    href: links::build_page_link(config, page, post_dates, page_size),
                })
            }
            (EntryKind::Number, None) => None,
            (EntryKind::Ellipsis, Some(target)) => Some(Node::Jump {
                class: config.dots_class.clone(),
                target,
            }),
            (EntryKind::Ellipsis, None) => Some(Node::Dots {
                class: config.dots_class.clone(),
            }),
        })
        .collect()
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub fn render_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Link { class, text, href } => out.push_str(&format!(
                r#"<a class="{}" href="{}">{}</a>"#,
                escape_html(class),
                escape_html(href),
                escape_html(text)
            )),
            Node::Dots { class } => out.push_str(&format!(
                r#"<span class="{}">...</span>"#,
                escape_html(class)
            )),
            Node::Jump { class, target } => out.push_str(&format!(
                r#"<button class="{}" type="button" data-page="{target}">...</button>"#,
                escape_html(class)
            )),
        }
    }
    out
}

pub fn render_json(nodes: &[Node]) -> Vec<u8> {
    serde_json::to_vec_pretty(nodes).unwrap_or_else(|_| b"[]\n".to_vec())
}

// relative hrefs are fine, only the query string is read.
fn max_results_from_href(href: &str) -> Option<usize> {
    let (_, query) = href.split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "max-results")
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

/// The hosting page, seen only through the containers the pager touches.
pub trait PagerView {
    /// Both the pager root and the numbers container exist.
    fn has_containers(&self) -> bool;
    /// Number of entries rendered in the entries container, if present.
    fn entry_count(&self) -> Option<usize>;
    /// `max-results` of the first link inside the pager root that has one.
    fn pager_link_max_results(&self) -> Option<usize>;
    /// Clears the numbers container and appends `nodes` in one batch.
    fn replace_numbers(&mut self, nodes: Vec<Node>);
    /// Removes the pager root.
    fn remove_pager(&mut self);
}

/// In-memory page used by the CLI and tests.
#[derive(Clone, Debug, Default)]
pub struct HtmlView {
    pub pager_present: bool,
    pub numbers_present: bool,
    pub entries: Option<usize>,
    pub numbers: Vec<Node>,
    pub renders: usize,
    /// hrefs of the links the pager root holds before rendering.
    pub pager_links: Vec<String>,
}

impl HtmlView {
    pub fn new(entries: Option<usize>) -> Self {
        Self {
            pager_present: true,
            numbers_present: true,
            entries,
            numbers: Vec::new(),
            renders: 0,
            pager_links: Vec::new(),
        }
    }

    pub fn with_pager_links(mut self, links: Vec<String>) -> Self {
        self.pager_links = links;
        self
    }

    pub fn is_removed(&self) -> bool {
        !self.pager_present
    }
}

impl PagerView for HtmlView {
    fn has_containers(&self) -> bool {
        self.pager_present && self.numbers_present
    }

    fn entry_count(&self) -> Option<usize> {
        self.entries
    }

    fn pager_link_max_results(&self) -> Option<usize> {
        self.pager_links
            .iter()
            .find(|href| href.contains("max-results="))
            .and_then(|href| max_results_from_href(href))
    }

    fn replace_numbers(&mut self, nodes: Vec<Node>) {
        self.numbers = nodes;
        self.renders += 1;
    }

    fn remove_pager(&mut self) {
        self.pager_present = false;
        self.numbers_present = false;
        self.numbers.clear();
    }
}
