// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Zero-based paging.

use serde::{Deserialize, Serialize};

use crate::error::{DataManagerError, DataResult};

/// Default page size used when a caller gives none.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size accepted.
pub const MAX_PAGE_SIZE: u32 = 1000;

// =============================================================================
// PageRequest
// =============================================================================

/// A request for one page of results.
///
/// # Examples
///
/// ```
/// use tender_core::PageRequest;
///
/// let page = PageRequest::of(2, 10);
/// assert_eq!(page.offset(), 20);
/// assert!(PageRequest::of(0, 0).validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: u32,
    /// Page size, at least 1.
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Creates a page request.
    pub const fn of(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Checks the size bounds.
    pub fn validate(&self) -> DataResult<()> {
        if self.size == 0 {
            return Err(DataManagerError::invalid_page("page size must be at least 1"));
        }
        if self.size > MAX_PAGE_SIZE {
            return Err(DataManagerError::invalid_page(format!(
                "page size must not exceed {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }

    /// Number of elements to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

// =============================================================================
// Page
// =============================================================================

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Elements on this page.
    pub content: Vec<T>,
    /// Zero-based page index.
    pub page: u32,
    /// Requested page size.
    pub size: u32,
    /// Number of elements across all pages.
    pub total_elements: u64,
    /// Number of pages.
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Creates a page from its content and the total count.
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.size.max(1));
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }

    /// Cuts a page out of an already ordered sequence.
    pub fn from_ordered(items: impl IntoIterator<Item = T>, request: PageRequest) -> Self {
        let items: Vec<T> = items.into_iter().collect();
        let total = items.len() as u64;
        let skip = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let content = items
            .into_iter()
            .skip(skip)
            .take(request.size as usize)
            .collect();
        Self::new(content, request, total)
    }

    /// Returns an empty page.
    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    /// Number of elements on this page.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns `true` if the page holds no elements.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns `true` if further pages follow.
    pub fn has_next(&self) -> bool {
        u64::from(self.page) + 1 < self.total_pages
    }

    /// Maps the content, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ordered_slices() {
        let page = Page::from_ordered(0..25, PageRequest::of(1, 10));
        assert_eq!(page.content, (10..20).collect::<Vec<_>>());
        assert_eq!(page.total_elements, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());
    }

    #[test]
    fn test_last_partial_page() {
        let page = Page::from_ordered(0..25, PageRequest::of(2, 10));
        assert_eq!(page.len(), 5);
        assert!(!page.has_next());
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let page = Page::from_ordered(0..5, PageRequest::of(3, 10));
        assert!(page.is_empty());
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_empty_source() {
        let page: Page<i32> = Page::from_ordered(Vec::new(), PageRequest::default());
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next());
    }

    #[test]
    fn test_validate_bounds() {
        assert!(PageRequest::of(0, 1).validate().is_ok());
        assert!(PageRequest::of(0, MAX_PAGE_SIZE).validate().is_ok());
        assert!(matches!(
            PageRequest::of(0, 0).validate(),
            Err(DataManagerError::InvalidPage { .. })
        ));
        assert!(PageRequest::of(0, MAX_PAGE_SIZE + 1).validate().is_err());
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::from_ordered(0..3, PageRequest::of(0, 2)).map(|n| n * 10);
        assert_eq!(page.content, vec![0, 10]);
        assert_eq!(page.total_pages, 2);
    }
}
