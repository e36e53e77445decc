use serde::Serialize;

use crate::window;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Number,
    Ellipsis,
}

/// One slot of the rendered page strip.
///
/// For `Number` entries `value` is the page number. For `Ellipsis` entries
/// it is the page to jump to when the ellipsis is clickable, and `None` when
/// the ellipsis is decorative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageEntry {
    pub kind: EntryKind,
    pub value: Option<usize>,
    pub is_active: bool,
}

impl PageEntry {
    pub fn number(page: usize, current_page: usize) -> Self {
        Self {
            kind: EntryKind::Number,
            value: Some(page),
            is_active: page == current_page,
        }
    }

    pub fn ellipsis(target: Option<usize>) -> Self {
        Self {
            kind: EntryKind::Ellipsis,
            value: target,
            is_active: false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ModelInput {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_visible_numbers: usize,
    pub interactive_ellipsis: bool,
}

// builds the strip: the window, plus a "1 …" prefix and a "… last" suffix
// when the edges are hidden.
pub fn build_model(input: ModelInput) -> Vec<PageEntry> {
    let ModelInput {
        current_page,
        total_pages,
        total_visible_numbers,
        interactive_ellipsis,
    } = input;

    let numbers = window::page_window(current_page, total_pages, total_visible_numbers);
    let (first, last) = match (numbers.first(), numbers.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };
    let half = total_visible_numbers.max(1) / 2;

    let mut entries: Vec<PageEntry> = Vec::with_capacity(numbers.len() + 4);

    if current_page > 1 && first != 1 {
        let target = interactive_ellipsis.then(|| first.saturating_add(1).saturating_sub(half).max(1));
        entries.push(PageEntry::number(1, current_page));
        entries.push(PageEntry::ellipsis(target));
    }

    entries.extend(numbers.iter().map(|n| PageEntry::number(*n, current_page)));

    if current_page < total_pages && last != total_pages {
        let target = interactive_ellipsis.then(|| last.saturating_add(half).saturating_sub(1).min(total_pages));
        entries.push(PageEntry::ellipsis(target));
        entries.push(PageEntry::number(total_pages, current_page));
    }

    entries
}
