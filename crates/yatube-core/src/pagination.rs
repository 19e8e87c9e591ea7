//! Fixed-size pagination over ordered records.
//!
//! The page size is configuration handed to [`Paginator::new`]. Requested page
//! numbers come straight from the query string, so resolution never fails:
//! absent or unparsable numbers (and numbers below 1) select the first page,
//! numbers past the end select the last page.

use serde::Serialize;

/// Splits record sequences into pages of `per_page` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: u64,
}

/// Where a resolved page sits inside the full sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlot {
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// One page of records plus its position.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl Paginator {
    /// A page size of zero is treated as one.
    pub fn new(per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of pages for `total` records. Always at least one.
    pub fn num_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.per_page).max(1)
    }

    /// Resolve a raw page number against `total` records.
    pub fn locate(&self, total: u64, requested: Option<&str>) -> PageSlot {
        let num_pages = self.num_pages(total);
        let number = requested
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|n| *n >= 1)
            .map(|n| n.min(num_pages))
            .unwrap_or(1);

        let offset = (number - 1) * self.per_page;
        let limit = self.per_page.min(total.saturating_sub(offset));

        PageSlot {
            number,
            num_pages,
            total,
            offset,
            limit,
        }
    }

    /// Paginate an in-memory sequence.
    pub fn paginate<T>(&self, items: Vec<T>, requested: Option<&str>) -> Page<T> {
        let slot = self.locate(items.len() as u64, requested);
        let page_items = items
            .into_iter()
            .skip(slot.offset as usize)
            .take(slot.limit as usize)
            .collect();
        slot.into_page(page_items)
    }
}

impl PageSlot {
    /// Wrap the records fetched for this slot.
    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_page_number(&self) -> Option<u64> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn next_page_number(&self) -> Option<u64> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn page_range(&self) -> impl Iterator<Item = u64> {
        1..=self.num_pages
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transform the records while keeping the position.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}
