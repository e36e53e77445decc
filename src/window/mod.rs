// the sliding run of page numbers shown around the current page.
//
// the window is centered on `current_page` and clamped to the first or last
// page when it would run past either edge. callers render nothing when the
// returned window is empty (`total_pages == 0`).
pub fn page_window(current_page: usize, total_pages: usize, total_visible_numbers: usize) -> Vec<usize> {
    let visible = total_visible_numbers.max(1);
    let half = visible / 2;

    let mut start = current_page.saturating_sub(half).max(1);
    let mut end = start.saturating_add(visible - 1).min(total_pages);

    if total_pages <= visible {
        start = 1;
        end = total_pages;
    } else if current_page <= half {
        start = 1;
        end = visible;
    } else if current_page >= total_pages - half {
        start = total_pages - visible + 1;
        end = total_pages;
    }

    (start..=end).collect()
}

// number of pages needed for `total_posts` at `page_size` posts per page.
pub fn total_pages(total_posts: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_posts.div_ceil(page_size)
}
