//! Length-aware pagination results

use serde::Serialize;

/// One page of results plus the totals needed to navigate the rest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginator<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
}

impl<T> Paginator<T> {
    pub fn new(items: Vec<T>, total: u64, per_page: u64, current_page: u64) -> Self {
        Self {
            items,
            total,
            per_page: per_page.max(1),
            current_page: current_page.max(1),
        }
    }

    /// Last page number; an empty result still has one page
    pub fn last_page(&self) -> u64 {
        self.total.div_ceil(self.per_page).max(1)
    }

    /// 1-based position of the first item on this page
    pub fn from(&self) -> Option<u64> {
        if self.items.is_empty() {
            return None;
        }
        Some(
            (self.current_page - 1)
                .saturating_mul(self.per_page)
                .saturating_add(1),
        )
    }

    /// 1-based position of the last item on this page
    pub fn to(&self) -> Option<u64> {
        self.from()
            .map(|from| from.saturating_add(self.items.len() as u64 - 1))
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page()
    }

    pub fn on_first_page(&self) -> bool {
        self.current_page <= 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transform the items, keeping the page metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginator<U> {
        Paginator {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_math() {
        let page = Paginator::new(vec![3, 4], 5, 2, 2);
        assert_eq!(page.last_page(), 3);
        assert_eq!(page.from(), Some(3));
        assert_eq!(page.to(), Some(4));
        assert!(page.has_more_pages());
        assert!(!page.on_first_page());
    }

    #[test]
    fn test_empty_page() {
        let page: Paginator<i32> = Paginator::new(Vec::new(), 0, 15, 1);
        assert_eq!(page.last_page(), 1);
        assert_eq!(page.from(), None);
        assert_eq!(page.to(), None);
        assert!(!page.has_more_pages());
        assert!(page.is_empty());
    }

    #[test]
    fn test_far_page_positions_saturate() {
        let page = Paginator::new(vec![1], 1, 15, u64::MAX);
        assert_eq!(page.from(), Some(u64::MAX));
        assert_eq!(page.to(), Some(u64::MAX));
        assert!(!page.has_more_pages());
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Paginator::new(vec![1, 2], 4, 2, 1).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total, 4);
        assert_eq!(page.last_page(), 2);
    }

    #[test]
    fn test_serializes_metadata() {
        let page = Paginator::new(vec!["a"], 1, 15, 1);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["per_page"], 15);
        assert_eq!(json["items"][0], "a");
    }
}
