//! Page-oriented access to query results.
//!
//! A [`PageRequest`] turns a 1-indexed page number and a page size into an offset and limit,
//! and [`Query::page`](crate::query::Query::page) returns the matching [`Page`].

use serde::{Deserialize, Serialize};

/// A single page of results.
///
/// # Example
///
/// ```ignore
/// let page: Page<Person> = people.query().asc("name").page(PageRequest::new(2, 20)).await?;
///
/// println!("{} of {} people", page.items.len(), page.count);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items contained in this page.
    pub items: Vec<T>,
    /// Total count of matching items across all pages.
    pub count: u64,
    /// The next page number (if more pages exist).
    pub next_page: Option<u64>,
    /// The previous page number (if this is not the first page).
    pub previous_page: Option<u64>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            next_page: None,
            previous_page: None,
        }
    }
}

/// Which page to fetch and how many items per page.
///
/// Pages are 1-indexed; page `0` is treated as page `1`. A `per_page` of `0` puts every match on
/// a single page.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PageRequest {
    /// The page number (1-indexed).
    pub page: u64,
    /// Number of items per page.
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page: page.max(1), per_page }
    }

    /// Number of items to skip to reach this page.
    ///
    /// ```ignore
    /// assert_eq!(PageRequest::new(3, 20).offset(), 40);
    /// ```
    pub fn offset(&self) -> u64 {
        self.page.max(1).saturating_sub(1).saturating_mul(self.per_page)
    }

    /// Wraps the items fetched for this request into a [`Page`] with navigation metadata.
    pub fn page_of<T>(&self, items: Vec<T>, count: u64) -> Page<T> {
        let page = self.page.max(1);
        let seen = self.offset().saturating_add(items.len() as u64);

        Page {
            next_page: (self.per_page > 0 && seen < count).then_some(page + 1),
            previous_page: (page > 1).then_some(page - 1),
            items,
            count,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, per_page: 10 }
    }
}
