//! Paginated list envelope returned by the backend list endpoints.

use serde::{Deserialize, Serialize};

/// Position of a [`Page`] within the full result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pageable {
    /// Zero-based page index.
    pub page_number: u32,
    /// Requested page size.
    pub page_size: u32,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Page position, when the backend reports it.
    #[serde(default)]
    pub pageable: Pageable,
    /// Total number of items across all pages.
    #[serde(default)]
    pub total_elements: u64,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Whether this is the last page.
    #[serde(default)]
    pub last: bool,
    /// Whether this is the first page.
    #[serde(default)]
    pub first: bool,
    /// Number of items on this page.
    #[serde(default)]
    pub number_of_elements: u32,
    /// Whether the page is empty.
    #[serde(default)]
    pub empty: bool,
}

impl<T> Page<T> {
    /// Build a single page holding every item.
    pub fn single(content: Vec<T>) -> Self {
        let len = u32::try_from(content.len()).unwrap_or(u32::MAX);
        Self {
            pageable: Pageable {
                page_number: 0,
                page_size: len,
            },
            total_elements: u64::from(len),
            total_pages: u32::from(len > 0),
            last: true,
            first: true,
            number_of_elements: len,
            empty: len == 0,
            content,
        }
    }

    /// Whether another page follows this one.
    pub fn has_next(&self) -> bool {
        !self.last
    }
}
