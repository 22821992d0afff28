use serde::Serialize;

/// A page of query results.
///
/// `total` is the number of matching records in the store, independent of
/// the page size. `items` never holds more than `per_page` elements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination<T> {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub items: Vec<T>,
}

impl<T> Pagination<T> {
    pub fn new(page: u64, per_page: u64, total: u64, items: Vec<T>) -> Self {
        debug_assert!(
            items.len() as u64 <= per_page,
            "page holds {} items but per_page is {per_page}",
            items.len()
        );
        Self {
            page,
            per_page,
            total,
            items,
        }
    }

    /// A page with no items and no matches.
    pub fn empty(page: u64, per_page: u64) -> Self {
        Self::new(page, per_page, 0, Vec::new())
    }

    /// First item of the page, if any.
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn into_first(self) -> Option<T> {
        self.items.into_iter().next()
    }

    /// `true` when the page carries no items. A page with items is "truthy".
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            0
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Convert every item, preserving order and the page metadata.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Pagination<U>, E> {
        let items = self.items.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(Pagination {
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            items,
        })
    }
}

impl<T> IntoIterator for Pagination<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_truthiness() {
        let page = Pagination::new(1, 10, 2, vec!["a", "b"]);
        assert_eq!(page.first(), Some(&"a"));
        assert!(!page.is_empty());

        let empty: Pagination<&str> = Pagination::empty(1, 10);
        assert_eq!(empty.first(), None);
        assert!(empty.is_empty());
        assert_eq!(empty.into_first(), None);
    }

    #[test]
    fn page_counts() {
        let page = Pagination::new(2, 2, 5, vec![3, 4]);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(page.has_prev());

        let last = Pagination::new(3, 2, 5, vec![5]);
        assert!(!last.has_next());
    }

    #[test]
    fn try_map_keeps_order_and_metadata() {
        let page = Pagination::new(1, 3, 7, vec![1, 2, 3]);
        let mapped: Pagination<String> = page.try_map(|n| Ok::<_, ()>(n.to_string())).unwrap();
        assert_eq!(mapped.items, ["1", "2", "3"]);
        assert_eq!(mapped.total, 7);

        let failed = Pagination::new(1, 3, 3, vec![1, 2, 3])
            .try_map(|n| if n == 2 { Err("bad") } else { Ok(n) });
        assert_eq!(failed.unwrap_err(), "bad");
    }
}
