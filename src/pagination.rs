//! This modules defines the common functionality for paging data.

use serde_json::{Value, json};

use crate::json_api::DocumentLinks;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of items per page when the user has not set a preference.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 50,
        }
    }
}

/// One page of a larger result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// The number of items across all pages.
    pub total: u64,
    /// The 1-indexed page number.
    pub current_page: u64,
    /// The maximum number of items on a page.
    pub per_page: u64,
}

impl<T> Page<T> {
    /// The number of pages, at least one even when there are no items.
    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            return 1;
        }

        self.total.div_ceil(self.per_page).max(1)
    }

    /// The `pagination` meta object.
    pub fn meta(&self) -> Value {
        json!({
            "total": self.total,
            "count": self.items.len(),
            "per_page": self.per_page,
            "current_page": self.current_page,
            "total_pages": self.total_pages(),
        })
    }

    /// Build the self, first, prev, next and last links for this page.
    ///
    /// `url` is the absolute URL of the collection without a query string and
    /// `params` are the query parameters that every link should keep.
    pub fn links(&self, url: &str, params: &[(&str, String)]) -> DocumentLinks {
        let page_url = |page: u64| {
            let mut query: Vec<(&str, String)> = params.to_vec();
            query.push(("page", page.to_string()));

            match serde_urlencoded::to_string(&query) {
                Ok(query_string) => format!("{url}?{query_string}"),
                Err(error) => {
                    tracing::error!("Could not encode pagination query {query:?}: {error}");
                    url.to_owned()
                }
            }
        };

        let last_page = self.total_pages();

        DocumentLinks {
            self_link: page_url(self.current_page),
            first: Some(page_url(1)),
            prev: (self.current_page > 1).then(|| page_url(self.current_page - 1)),
            next: (self.current_page < last_page).then(|| page_url(self.current_page + 1)),
            last: Some(page_url(last_page)),
        }
    }
}
