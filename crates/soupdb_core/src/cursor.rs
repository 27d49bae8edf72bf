//! Paging cursor over query results.

use crate::error::{CoreError, CoreResult};
use crate::query::QuerySpec;
use crate::store::Store;
use soupdb_codec::Value;

/// Walks the results of a query one page at a time.
///
/// The total entry count is captured when the cursor is opened; each page is
/// fetched from the store on demand. Entries written after the cursor was
/// opened may or may not show up, but paging never skips or repeats an
/// entry that was stable throughout.
///
/// ```rust
/// use soupdb_core::{QuerySpec, Store};
/// use soupdb_codec::Value;
///
/// let store = Store::open_in_memory("scratch").unwrap();
/// store.register_soup("items", &[]).unwrap();
/// let docs = (0..5).map(|i| Value::map([("n", Value::from(i))])).collect();
/// store.upsert_entries("items", docs, None).unwrap();
///
/// let cursor = store.query_soup("items", &QuerySpec::all(2)).unwrap();
/// assert_eq!(cursor.total_pages(), 3);
/// let sizes: Vec<usize> = cursor.map(|page| page.unwrap().len()).collect();
/// assert_eq!(sizes, vec![2, 2, 1]);
/// ```
pub struct SoupCursor<'a> {
    store: &'a Store,
    soup: String,
    spec: QuerySpec,
    total_entries: usize,
    total_pages: usize,
    next_page: usize,
    current_page: Option<usize>,
}

impl<'a> SoupCursor<'a> {
    pub(crate) fn new(store: &'a Store, soup: &str, spec: QuerySpec, total_entries: usize) -> Self {
        let total_pages = total_entries.div_ceil(spec.page_size.max(1));
        Self {
            store,
            soup: soup.to_string(),
            spec,
            total_entries,
            total_pages,
            next_page: 0,
            current_page: None,
        }
    }

    /// Soup being queried.
    pub fn soup(&self) -> &str {
        &self.soup
    }

    /// The query this cursor runs.
    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Entries per page.
    pub fn page_size(&self) -> usize {
        self.spec.page_size
    }

    /// Matching entries when the cursor was opened.
    pub fn total_entries(&self) -> usize {
        self.total_entries
    }

    /// Number of pages, `ceil(total_entries / page_size)`.
    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Index of the page most recently returned, if any.
    pub fn current_page_index(&self) -> Option<usize> {
        self.current_page
    }

    /// True if [`SoupCursor::next_page`] will return a page.
    pub fn has_next_page(&self) -> bool {
        self.next_page < self.total_pages
    }

    /// Pages not yet returned.
    pub fn remaining_pages(&self) -> usize {
        self.total_pages.saturating_sub(self.next_page)
    }

    /// Returns the next page, or an empty page once the cursor is exhausted.
    pub fn next_page(&mut self) -> CoreResult<Vec<Value>> {
        if !self.has_next_page() {
            return Ok(Vec::new());
        }
        let page = self.store.query(&self.soup, &self.spec, self.next_page)?;
        self.current_page = Some(self.next_page);
        self.next_page += 1;
        Ok(page)
    }

    /// Positions the cursor so the next call to [`SoupCursor::next_page`]
    /// returns page `index`.
    ///
    /// # Errors
    ///
    /// `Validation` if `index` is not below [`SoupCursor::total_pages`].
    /// Page 0 is always accepted.
    pub fn move_to_page(&mut self, index: usize) -> CoreResult<()> {
        if index != 0 && index >= self.total_pages {
            return Err(CoreError::validation(format!(
                "page {index} is out of range, cursor has {} pages",
                self.total_pages
            )));
        }
        self.next_page = index;
        Ok(())
    }
}

impl Iterator for SoupCursor<'_> {
    type Item = CoreResult<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next_page() {
            return None;
        }
        Some(self.next_page())
    }
}

impl std::fmt::Debug for SoupCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoupCursor")
            .field("soup", &self.soup)
            .field("total_entries", &self.total_entries)
            .field("total_pages", &self.total_pages)
            .field("next_page", &self.next_page)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::index::IndexSpec;
    use crate::query::SortOrder;

    fn store_with(n: i64) -> Store {
        let store = Store::open_in_memory("cursor").unwrap();
        store.register_soup("items", &[IndexSpec::integer("n")]).unwrap();
        let docs = (0..n).map(|i| Value::map([("n", Value::Integer(i))])).collect();
        store.upsert_entries("items", docs, None).unwrap();
        store
    }

    fn numbers(page: &[Value]) -> Vec<i64> {
        page.iter()
            .filter_map(|d| d.get("n").and_then(Value::as_integer))
            .collect()
    }

    #[test]
    fn pages_cover_every_entry_once() {
        let store = store_with(7);
        let spec = QuerySpec::all(3).order_by("n", SortOrder::Descending);
        let mut cursor = store.query_soup("items", &spec).unwrap();

        assert_eq!(cursor.total_entries(), 7);
        assert_eq!(cursor.total_pages(), 3);
        assert_eq!(cursor.current_page_index(), None);

        assert_eq!(numbers(&cursor.next_page().unwrap()), vec![6, 5, 4]);
        assert_eq!(numbers(&cursor.next_page().unwrap()), vec![3, 2, 1]);
        assert_eq!(cursor.remaining_pages(), 1);
        assert_eq!(numbers(&cursor.next_page().unwrap()), vec![0]);

        assert!(!cursor.has_next_page());
        assert_eq!(cursor.current_page_index(), Some(2));
        assert!(cursor.next_page().unwrap().is_empty());
        assert_eq!(cursor.current_page_index(), Some(2));
    }

    #[test]
    fn move_to_page_rewinds() {
        let store = store_with(4);
        let mut cursor = store.query_soup("items", &QuerySpec::all(2)).unwrap();
        cursor.next_page().unwrap();
        cursor.next_page().unwrap();

        cursor.move_to_page(1).unwrap();
        assert_eq!(numbers(&cursor.next_page().unwrap()), vec![2, 3]);

        let err = cursor.move_to_page(2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn empty_result_has_no_pages() {
        let store = store_with(0);
        let mut cursor = store.query_soup("items", &QuerySpec::all(5)).unwrap();
        assert_eq!(cursor.total_pages(), 0);
        cursor.move_to_page(0).unwrap();
        assert!(cursor.next_page().unwrap().is_empty());
        assert_eq!(cursor.count(), 0);
    }

    #[test]
    fn cursor_on_unknown_soup_fails() {
        let store = store_with(1);
        let err = store.query_soup("missing", &QuerySpec::all(5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
