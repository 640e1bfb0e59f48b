//! Page-number pagination over reverse-chronological listings.

use serde::Serialize;
use std::{fmt::Display, num::NonZeroU32};

/// 1-based page number.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct PageNumber(NonZeroU32);

impl PageNumber {
    pub const FIRST: Self = Self(NonZeroU32::MIN);

    #[must_use]
    pub fn new(number: u32) -> Option<Self> {
        NonZeroU32::new(number).map(Self)
    }

    /// Lenient parse of a `?page=` parameter: anything missing, unparsable or
    /// zero resolves to the first page.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|raw| raw.trim().parse::<u32>().ok())
            .and_then(Self::new)
            .unwrap_or(Self::FIRST)
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    #[must_use]
    pub fn window(self, page_size: NonZeroU32) -> Window {
        let limit = u64::from(page_size.get());
        Window {
            offset: u64::from(self.get() - 1) * limit,
            limit: Some(limit),
        }
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl Display for PageNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Slice of an ordered listing. `limit: None` means "to the end".
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct Window {
    pub offset: u64,
    pub limit: Option<u64>,
}

impl Window {
    pub const ALL: Self = Self {
        offset: 0,
        limit: None,
    };
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PageInfo {
    pub number: u32,
    pub page_size: u32,
    pub num_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageInfo {
    /// An empty listing still has one (empty) page.
    #[must_use]
    pub fn new(number: PageNumber, page_size: NonZeroU32, total_count: u64) -> Self {
        let num_pages = total_count
            .div_ceil(u64::from(page_size.get()))
            .max(1);
        let num_pages = u32::try_from(num_pages).unwrap_or(u32::MAX);
        let number = number.get();

        Self {
            number,
            page_size: page_size.get(),
            num_pages,
            has_previous: number > 1,
            has_next: number < num_pages,
        }
    }

    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        self.number > self.num_pages
    }
}

#[cfg(test)]
mod tests {
    use crate::pagination::{PageInfo, PageNumber, Window};
    use std::num::NonZeroU32;

    fn ten() -> NonZeroU32 {
        NonZeroU32::new(10).unwrap()
    }

    #[test]
    fn lenient_page_parameter() {
        assert_eq!(PageNumber::parse(None), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("abc")), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("0")), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("-2")), PageNumber::FIRST);
        assert_eq!(PageNumber::parse(Some("3")).get(), 3);
    }

    #[test]
    fn window_of_second_page() {
        assert_eq!(
            PageNumber::new(2).unwrap().window(ten()),
            Window {
                offset: 10,
                limit: Some(10),
            }
        );
    }

    #[test]
    fn page_info_for_thirteen_items() {
        let first = PageInfo::new(PageNumber::FIRST, ten(), 13);
        assert_eq!(first.num_pages, 2);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let second = PageInfo::new(PageNumber::new(2).unwrap(), ten(), 13);
        assert!(!second.has_next);
        assert!(second.has_previous);

        let third = PageInfo::new(PageNumber::new(3).unwrap(), ten(), 13);
        assert!(third.is_out_of_range());
        assert!(!third.has_next);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let info = PageInfo::new(PageNumber::FIRST, ten(), 0);
        assert_eq!(info.num_pages, 1);
        assert!(!info.is_out_of_range());
    }
}
