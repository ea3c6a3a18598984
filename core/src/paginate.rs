use std::fmt;

/// Consecutive pages of at most `page_size` items.
#[derive(Debug, Clone)]
pub struct Paginator<'a, T> {
    pages: Vec<Page<'a, T>>,
}

#[derive(Debug, Clone, Copy)]
pub struct Page<'a, T> {
    items: &'a [T],
}

impl<'a, T> Page<'a, T> {
    pub fn items(&self) -> &'a [T] {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: fmt::Display> fmt::Display for Page<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in self.items {
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

impl<'a, T> Paginator<'a, T> {
    /// A page size of zero yields no pages.
    pub fn new(items: &'a [T], page_size: usize) -> Self {
        let pages = if page_size == 0 {
            Vec::new()
        } else {
            items.chunks(page_size).map(|items| Page { items }).collect()
        };
        Self { pages }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Page<'a, T>> {
        self.pages.iter()
    }
}

impl<'p, 'a, T> IntoIterator for &'p Paginator<'a, T> {
    type Item = &'p Page<'a, T>;
    type IntoIter = std::slice::Iter<'p, Page<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

pub fn paginate<T>(items: &[T], page_size: usize) -> Paginator<'_, T> {
    Paginator::new(items, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn last_page_may_be_short() {
        let items = [1, 2, 3, 4, 5];
        let pages = paginate(&items, 2);
        assert_eq!(pages.len(), 3);
        let sizes: Vec<_> = pages.iter().map(|p| p.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(pages.iter().last().unwrap().items(), &[5]);
    }

    #[test]
    fn zero_page_size_has_no_pages() {
        assert!(paginate(&[1, 2], 0).is_empty());
        assert!(paginate::<i32>(&[], 3).is_empty());
    }

    #[test]
    fn page_displays_each_document() {
        let docs = [Document::new(1, 0.5, 2), Document::new(2, 0.25, 1)];
        let pages = paginate(&docs, 2);
        let page = pages.iter().next().unwrap();
        assert_eq!(
            page.to_string(),
            "{ document_id = 1, relevance = 0.5, rating = 2 }{ document_id = 2, relevance = 0.25, rating = 1 }"
        );
    }
}
