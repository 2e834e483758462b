//! Fixed-size page selection for listing queries.

use serde::{Deserialize, Serialize};

/// Number of items returned per page.
pub const PAGE_SIZE: u32 = 10;

/// Zero-based page number.
///
/// # Examples
/// ```
/// use engagement::domain::PageRequest;
///
/// let page = PageRequest::new(2);
/// assert_eq!(page.offset(), 20);
/// assert_eq!(page.limit(), 10);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageRequest {
    number: u32,
}

impl PageRequest {
    pub fn new(number: u32) -> Self {
        Self { number }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Rows to skip: `PAGE_SIZE * number`.
    pub fn offset(&self) -> u64 {
        u64::from(PAGE_SIZE) * u64::from(self.number)
    }

    pub fn limit(&self) -> u64 {
        u64::from(PAGE_SIZE)
    }

    /// Apply this page to an already ordered sequence.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let skip = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .into_iter()
            .skip(skip)
            .take(PAGE_SIZE as usize)
            .collect()
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest) -> Self {
        Self {
            items,
            page: request.number(),
            page_size: PAGE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0..10)]
    #[case(1, 10..20)]
    #[case(2, 20..25)]
    #[case(3, 0..0)]
    fn slice_selects_the_requested_window(#[case] number: u32, #[case] expected: std::ops::Range<u32>) {
        let items: Vec<u32> = (0..25).collect();
        let page = PageRequest::new(number).slice(items);
        assert_eq!(page, expected.collect::<Vec<_>>());
    }
}
