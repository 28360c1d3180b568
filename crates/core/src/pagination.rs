//! Pagination engine
//!
//! Pure functions that window an ordered row collection into pages. The
//! requested page is always clamped into `[1, total_pages]`, so callers never
//! hold a dangling page pointer after the collection shrinks.

use serde::Serialize;

/// One page of an ordered collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub visible_rows: &'a [T],
    pub total_items: usize,
    pub total_pages: usize,
    pub effective_page: usize,
}

/// Pagination metadata for display ("Showing 11 to 20 of 25")
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationInfo {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
    /// 1-based position of the first visible item, 0 when empty
    pub first_item: usize,
    /// 1-based position of the last visible item, 0 when empty
    pub last_item: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PaginationInfo {
    pub fn new(total_items: usize, page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_pages(total_items, page_size);
        let current_page = page.clamp(1, total_pages);
        let (start, end) = page_bounds(total_items, current_page, page_size);

        let (first_item, last_item) = if start < end { (start + 1, end) } else { (0, 0) };

        Self {
            current_page,
            total_pages,
            total_items,
            page_size,
            first_item,
            last_item,
            has_prev: current_page > 1,
            has_next: current_page < total_pages,
        }
    }
}

/// Entry of a pagination control strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageLink {
    Page(usize),
    Ellipsis,
}

/// Number of pages needed for `total_items`, never less than one
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1)).max(1)
}

/// Clamp any requested page number into `[1, max(1, total_pages)]`
pub fn clamp_page(requested: i64, total_pages: usize) -> usize {
    let last = i64::try_from(total_pages.max(1)).unwrap_or(i64::MAX);
    // The clamped value is within 1..=total_pages, so it fits in usize.
    usize::try_from(requested.clamp(1, last)).unwrap_or(1)
}

/// Calculate slice bounds for a given page
///
/// Returns (start_index, end_index) clipped to `total_items`.
pub fn page_bounds(total_items: usize, page: usize, page_size: usize) -> (usize, usize) {
    let page_size = page_size.max(1);
    let start = page
        .saturating_sub(1)
        .saturating_mul(page_size)
        .min(total_items);
    let end = start.saturating_add(page_size).min(total_items);
    (start, end)
}

/// Select the rows of the requested page
///
/// A `page_size` of zero is treated as one.
pub fn paginate<T>(rows: &[T], requested_page: i64, page_size: usize) -> Page<'_, T> {
    let total_items = rows.len();
    let total_pages = total_pages(total_items, page_size);
    let effective_page = clamp_page(requested_page, total_pages);
    let (start, end) = page_bounds(total_items, effective_page, page_size);

    Page {
        visible_rows: &rows[start..end],
        total_items,
        total_pages,
        effective_page,
    }
}

/// Build a compact page-link strip
///
/// Always shows the first and last page and `window` pages on each side of
/// `current`, with an ellipsis for every gap.
pub fn page_links(current: usize, total_pages: usize, window: usize) -> Vec<PageLink> {
    let total_pages = total_pages.max(1);
    let current = current.clamp(1, total_pages);
    let low = current.saturating_sub(window).max(1);
    let high = current.saturating_add(window).min(total_pages);

    let mut links = Vec::new();

    if low > 1 {
        links.push(PageLink::Page(1));
        if low > 2 {
            links.push(PageLink::Ellipsis);
        }
    }

    links.extend((low..=high).map(PageLink::Page));

    if high < total_pages {
        if high + 1 < total_pages {
            links.push(PageLink::Ellipsis);
        }
        links.push(PageLink::Page(total_pages));
    }

    links
}
