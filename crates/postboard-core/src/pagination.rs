//! Page-number pagination shared by every listing.

use serde::Serialize;

/// Number of items on a full page.
pub const PAGE_SIZE: u64 = 10;

/// A 1-indexed page number requested by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u64,
    size: u64,
}

impl PageRequest {
    pub fn new(number: u64) -> Self {
        Self {
            number: number.max(1),
            size: PAGE_SIZE,
        }
    }

    /// Parse the `page` query value; absent, non-numeric or zero values mean page 1.
    pub fn parse(raw: Option<&str>) -> Self {
        let number = raw
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(1);
        Self::new(number)
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Rows to skip before this page starts.
    pub fn offset(&self) -> u64 {
        (self.number - 1).saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

/// One page of an ordered listing.
///
/// A page past the end holds no items but still reports the full `total_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u64,
    pub total_count: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_count: u64) -> Self {
        Self {
            items,
            page_number: request.number(),
            total_count,
            page_size: request.size(),
        }
    }

    /// Cut the requested page out of an already ordered, complete sequence.
    pub fn from_ordered(all: Vec<T>, request: PageRequest) -> Self {
        let total_count = all.len() as u64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size() as usize)
            .collect();
        Self::new(items, request, total_count)
    }

    /// Number of pages, never less than one.
    pub fn num_pages(&self) -> u64 {
        self.total_count.div_ceil(self.page_size).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.num_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            total_count: self.total_count,
            page_size: self.page_size,
        }
    }
}
