//! Pagination helper for list views

use crate::core::querydict::QueryDict;
use serde::Serialize;

/// One rendered page link
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageLink {
    pub text: String,
    pub href: String,
    pub active: bool,
}

/// Page window for a list view
///
/// The requested page is clamped into `[1, max(1, total_pages)]`, so an
/// out-of-range or malformed `page` parameter never fails.
///
/// # Example
/// ```rust,ignore
/// let p = Pagination::new(Some("2"), 145, "/stark/app/host/list/", query, 20, 11);
/// assert_eq!((p.start(), p.end()), (20, 40));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub per_page: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,

    #[serde(skip)]
    base_url: String,

    #[serde(skip)]
    query_params: QueryDict,

    #[serde(skip)]
    max_pager: usize,
}

impl Pagination {
    pub fn new(
        current_page: Option<&str>,
        total: usize,
        base_url: impl Into<String>,
        query_params: QueryDict,
        per_page: usize,
        max_pager: usize,
    ) -> Self {
        // Ensure per_page is at least 1 to avoid division by zero
        let per_page = per_page.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(per_page) };
        let requested = current_page
            .and_then(|p| p.trim().parse::<usize>().ok())
            .unwrap_or(1);
        let page = requested.clamp(1, total_pages.max(1));

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
            base_url: base_url.into(),
            query_params,
            max_pager: max_pager.max(1),
        }
    }

    /// First row index of the window
    pub fn start(&self) -> usize {
        (self.page - 1) * self.per_page
    }

    /// One past the last row index of the window
    pub fn end(&self) -> usize {
        self.page * self.per_page
    }

    fn href(&self, page: usize) -> String {
        let mut params = self.query_params.clone();
        params.set("page", page.to_string());
        format!("{}?{}", self.base_url, params.urlencode())
    }

    /// Previous link, a window of at most `max_pager` numbered links, next link
    pub fn page_links(&self) -> Vec<PageLink> {
        let mut links = Vec::new();
        if self.total_pages == 0 {
            return links;
        }

        let half = self.max_pager / 2;
        let (first, last) = if self.total_pages <= self.max_pager {
            (1, self.total_pages)
        } else if self.page <= half {
            (1, self.max_pager)
        } else if self.page + half > self.total_pages {
            (self.total_pages + 1 - self.max_pager, self.total_pages)
        } else {
            (self.page - half, self.page - half + self.max_pager - 1)
        };

        if self.has_prev {
            links.push(PageLink {
                text: "«".to_string(),
                href: self.href(self.page - 1),
                active: false,
            });
        }
        for n in first..=last {
            links.push(PageLink {
                text: n.to_string(),
                href: self.href(n),
                active: n == self.page,
            });
        }
        if self.has_next {
            links.push(PageLink {
                text: "»".to_string(),
                href: self.href(self.page + 1),
                active: false,
            });
        }
        links
    }
}
