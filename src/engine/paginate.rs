//! Page arithmetic: page count, clamping, slice bounds and the
//! "Showing X to Y of Z" numbers.

use std::ops::Range;

/// Where the current page sits inside the filtered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// 1-based, always within `1..=total_pages`.
    pub current_page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_items: usize,
    /// 1-based display bounds; both 0 when there is nothing to show.
    pub start_item: usize,
    pub end_item: usize,
    /// Index of the first displayed row within the whole filtered set.
    pub offset: usize,
    /// The page was sliced upstream; `total_items` only counts this page.
    pub remote: bool,
    slice_start: usize,
    slice_end: usize,
}

impl PageInfo {
    /// Index range of the displayed rows within the collection handed to
    /// [`paginate`] (or the whole remote page).
    pub fn range(&self) -> Range<usize> {
        self.slice_start..self.slice_end
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.range();
        let end = range.end.min(items.len());
        let start = range.start.min(end);
        &items[start..end]
    }

    pub fn len(&self) -> usize {
        self.slice_end - self.slice_start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Absolute 1-based row number for the `index`-th displayed row.
    pub fn row_number(&self, index: usize) -> usize {
        self.offset + index + 1
    }
}

/// `max(1, ceil(count / page_size))`. A zero page size is treated as 1.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Client-side pagination of `count` items.
pub fn paginate(count: usize, page: usize, page_size: usize) -> PageInfo {
    let page_size = page_size.max(1);
    let total = total_pages(count, page_size);
    let current = clamp_page(page, total);
    let slice_start = ((current - 1) * page_size).min(count);
    let slice_end = (current * page_size).min(count);
    let (start_item, end_item) = if slice_start < slice_end {
        (slice_start + 1, slice_end)
    } else {
        (0, 0)
    };
    PageInfo {
        current_page: current,
        total_pages: total,
        page_size,
        total_items: count,
        start_item,
        end_item,
        offset: slice_start,
        remote: false,
        slice_start,
        slice_end,
    }
}

/// Pass-through for pages already sliced by a server: `count` items on the
/// page, `total_pages` as reported upstream.
pub fn paginate_remote(count: usize, page: usize, total_pages: usize, page_size: usize) -> PageInfo {
    let page_size = page_size.max(1);
    let total = total_pages.max(1);
    let current = clamp_page(page, total);
    let offset = (current - 1) * page_size;
    let (start_item, end_item) = if count == 0 {
        (0, 0)
    } else {
        (offset + 1, offset + count)
    };
    PageInfo {
        current_page: current,
        total_pages: total,
        page_size,
        total_items: count,
        start_item,
        end_item,
        offset,
        remote: true,
        slice_start: 0,
        slice_end: count,
    }
}

/// Up to `width` page numbers centered on `current`, shifted to stay inside
/// `1..=total`. Fewer than `width` pages are all shown.
pub fn page_window(current: usize, total: usize, width: usize) -> Vec<usize> {
    let total = total.max(1);
    let current = clamp_page(current, total);
    let last_start = total.saturating_sub(width).saturating_add(1).max(1);
    let first = current.saturating_sub(width / 2).clamp(1, last_start);
    (first..=total).take(width).collect()
}

/// Enabled state of the previous/next controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNav {
    pub previous: bool,
    pub next: bool,
}

impl PageNav {
    pub fn new(info: &PageInfo, loading: bool, errored: bool) -> Self {
        let usable = !loading && !errored;
        Self {
            previous: usable && info.has_previous(),
            next: usable && info.has_next(),
        }
    }
}
