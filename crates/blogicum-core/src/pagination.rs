//! Fixed-size pagination for post listings.

use serde::Serialize;

use crate::error::DomainError;

/// Posts shown per listing page.
pub const PAGE_SIZE: u64 = 10;

/// Which page a listing request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageQuery {
    #[default]
    First,
    Number(u64),
    Last,
}

impl PageQuery {
    /// Parse the raw `page` query parameter. Absent means the first page.
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(PageQuery::First),
            Some("last") => Ok(PageQuery::Last),
            Some(value) => value
                .parse::<u64>()
                .map(PageQuery::Number)
                .map_err(|_| DomainError::not_found("page", value)),
        }
    }
}

/// Offset/limit slice of an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

/// One page of results plus the numbers a pager needs.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub per_page: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Resolves page requests against a known total.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(total: u64, per_page: u64) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    /// Number of pages; an empty result set still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        self.total.div_ceil(self.per_page).max(1)
    }

    /// Resolve `query` to a 1-based page number, or not-found when out of range.
    pub fn resolve(&self, query: PageQuery) -> Result<u64, DomainError> {
        let number = match query {
            PageQuery::First => 1,
            PageQuery::Last => self.num_pages(),
            PageQuery::Number(n) => n,
        };
        if number == 0 || number > self.num_pages() {
            return Err(DomainError::not_found("page", number));
        }
        Ok(number)
    }

    pub fn window(&self, number: u64) -> Window {
        Window {
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }

    pub fn page<T>(&self, number: u64, items: Vec<T>) -> Page<T> {
        let num_pages = self.num_pages();
        Page {
            items,
            number,
            num_pages,
            total: self.total,
            per_page: self.per_page,
            has_previous: number > 1,
            has_next: number < num_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_listing_has_one_page() {
        let paginator = Paginator::new(0, PAGE_SIZE);
        assert_eq!(paginator.num_pages(), 1);
        assert_eq!(paginator.resolve(PageQuery::First).unwrap(), 1);
        assert!(paginator.resolve(PageQuery::Number(2)).is_err());
    }

    #[test]
    fn test_window_and_flags() {
        let paginator = Paginator::new(25, PAGE_SIZE);
        assert_eq!(paginator.num_pages(), 3);

        let last = paginator.resolve(PageQuery::Last).unwrap();
        assert_eq!(last, 3);
        assert_eq!(paginator.window(last), Window { offset: 20, limit: 10 });

        let page = paginator.page(2, vec![(); 10]);
        assert!(page.has_previous);
        assert!(page.has_next);

        let page = paginator.page(3, vec![(); 5]);
        assert!(!page.has_next);
    }

    #[test]
    fn test_out_of_range_pages_are_not_found() {
        let paginator = Paginator::new(10, PAGE_SIZE);
        assert!(matches!(
            paginator.resolve(PageQuery::Number(0)),
            Err(DomainError::NotFound { .. })
        ));
        assert!(paginator.resolve(PageQuery::Number(2)).is_err());
    }

    #[test]
    fn test_parse_page_param() {
        assert_eq!(PageQuery::parse(None).unwrap(), PageQuery::First);
        assert_eq!(PageQuery::parse(Some("3")).unwrap(), PageQuery::Number(3));
        assert_eq!(PageQuery::parse(Some("last")).unwrap(), PageQuery::Last);
        assert!(PageQuery::parse(Some("abc")).is_err());
        assert!(PageQuery::parse(Some("-1")).is_err());
    }
}
