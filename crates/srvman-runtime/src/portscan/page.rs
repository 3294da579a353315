//! Fixed-size pages over a filtered scan.

use serde::Serialize;
use srvman_core::PortRecord;

/// One page of port records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortPage {
    /// Zero-based page index that was requested
    pub index: usize,
    /// Total pages for the filtered set (at least 1)
    pub page_count: usize,
    /// Records matching the filter across all pages
    pub total: usize,
    pub records: Vec<PortRecord>,
}

impl PortPage {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Number of pages needed for `total` records. Never less than 1.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// Slice `records` into page `index`.
///
/// A page past the end is empty rather than an error.
pub fn paginate(records: &[PortRecord], index: usize, page_size: usize) -> PortPage {
    let page_size = page_size.max(1);
    let start = index.saturating_mul(page_size);
    let page = records
        .iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    PortPage {
        index,
        page_count: page_count(records.len(), page_size),
        total: records.len(),
        records: page,
    }
}

/// Current page position for next/previous navigation.
///
/// The index is always clamped to the pages that exist for the most recent
/// record count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortPager {
    index: usize,
    page_count: usize,
}

impl PortPager {
    pub const fn new() -> Self {
        Self {
            index: 0,
            page_count: 1,
        }
    }

    pub const fn index(&self) -> usize {
        self.index
    }

    /// Record a fresh result size and pull the index back into range.
    pub fn update(&mut self, total: usize, page_size: usize) {
        self.page_count = page_count(total, page_size);
        self.index = self.index.min(self.page_count - 1);
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Advance one page. Returns `false` when already on the last page.
    pub fn next(&mut self) -> bool {
        if self.index + 1 < self.page_count.max(1) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page. Returns `false` when already on the first page.
    pub fn prev(&mut self) -> bool {
        if self.index > 0 {
            self.index -= 1;
            true
        } else {
            false
        }
    }
}

impl Default for PortPager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(count: u16) -> Vec<PortRecord> {
        (0..count)
            .map(|i| PortRecord::new(25565 + i, 1000 + u32::from(i), "java"))
            .collect()
    }

    #[test]
    fn test_twenty_five_records_page_size_ten() {
        let all = records(25);

        let first = paginate(&all, 0, 10);
        assert_eq!(first.records.len(), 10);
        assert_eq!(first.page_count, 3);
        assert_eq!(first.total, 25);

        let third = paginate(&all, 2, 10);
        assert_eq!(third.records.len(), 5);
        assert_eq!(third.records[0].port, 25585);

        let beyond = paginate(&all, 3, 10);
        assert!(beyond.is_empty());
        assert_eq!(beyond.page_count, 3);
    }

    #[test]
    fn test_empty_set_has_one_page() {
        let page = paginate(&[], 0, 10);
        assert!(page.is_empty());
        assert_eq!(page.page_count, 1);
    }

    #[test]
    fn test_huge_index_does_not_overflow() {
        assert!(paginate(&records(3), usize::MAX, 10).is_empty());
    }

    #[test]
    fn test_pager_clamps_navigation() {
        let mut pager = PortPager::new();
        pager.update(25, 10);

        assert!(!pager.prev());
        assert!(pager.next());
        assert!(pager.next());
        assert_eq!(pager.index(), 2);
        assert!(!pager.next());
        assert_eq!(pager.index(), 2);
    }

    #[test]
    fn test_pager_pulls_index_back_when_results_shrink() {
        let mut pager = PortPager::new();
        pager.update(25, 10);
        pager.next();
        pager.next();

        pager.update(4, 10);
        assert_eq!(pager.index(), 0);
        assert!(!pager.next());
    }

    #[test]
    fn test_pager_with_nothing_to_show() {
        let mut pager = PortPager::new();
        pager.update(0, 10);
        assert!(!pager.next());
        assert!(!pager.prev());
        assert_eq!(pager.index(), 0);
    }
}
