// routes/pagination.rs
// Page-number window and "Showing X to Y of Z" bounds for the list pages.

/// Largest number of page links rendered at once.
pub const MAX_PAGE_LINKS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
    pub first_shown: u64,
    pub last_shown: u64,
    pub pages: Vec<u32>,
    pub prev: Option<u32>,
    pub next: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLink {
    pub number: u32,
    pub current: bool,
}

impl PageWindow {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX);

        let (first_shown, last_shown) = if total == 0 {
            (0, 0)
        } else {
            let first = u64::from(page - 1) * u64::from(limit) + 1;
            let last = (u64::from(page) * u64::from(limit)).min(total);
            (first.min(total), last)
        };

        let pages = if total_pages == 0 {
            Vec::new()
        } else {
            let current = page.min(total_pages);
            let mut start = current.saturating_sub(MAX_PAGE_LINKS / 2).max(1);
            let end = start.saturating_add(MAX_PAGE_LINKS - 1).min(total_pages);
            if end - start + 1 < MAX_PAGE_LINKS {
                start = end.saturating_sub(MAX_PAGE_LINKS - 1).max(1);
            }
            (start..=end).collect()
        };

        Self {
            page,
            limit,
            total,
            total_pages,
            first_shown,
            last_shown,
            pages,
            prev: (page > 1).then(|| page - 1),
            next: (page < total_pages).then(|| page + 1),
        }
    }

    pub fn links(&self) -> Vec<PageLink> {
        self.pages
            .iter()
            .map(|&number| PageLink {
                number,
                current: number == self.page,
            })
            .collect()
    }

    /// Pagination controls are hidden for a single page.
    pub fn has_many_pages(&self) -> bool {
        self.total_pages > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_pages_and_bounds() {
        let w = PageWindow::new(2, 10, 35);
        assert_eq!(w.total_pages, 4);
        assert_eq!((w.first_shown, w.last_shown), (11, 20));
        assert_eq!(w.prev, Some(1));
        assert_eq!(w.next, Some(3));

        let last = PageWindow::new(4, 10, 35);
        assert_eq!((last.first_shown, last.last_shown), (31, 35));
        assert_eq!(last.next, None);
    }

    #[test]
    fn empty_listing() {
        let w = PageWindow::new(1, 10, 0);
        assert_eq!(w.total_pages, 0);
        assert_eq!((w.first_shown, w.last_shown), (0, 0));
        assert!(w.pages.is_empty());
        assert_eq!(w.prev, None);
        assert_eq!(w.next, None);
        assert!(!w.has_many_pages());
    }

    #[test]
    fn window_is_centred_and_clamped() {
        assert_eq!(PageWindow::new(1, 10, 200).pages, vec![1, 2, 3, 4, 5]);
        assert_eq!(PageWindow::new(7, 10, 200).pages, vec![5, 6, 7, 8, 9]);
        assert_eq!(PageWindow::new(20, 10, 200).pages, vec![16, 17, 18, 19, 20]);
        assert_eq!(PageWindow::new(19, 10, 200).pages, vec![16, 17, 18, 19, 20]);
        assert_eq!(PageWindow::new(2, 10, 30).pages, vec![1, 2, 3]);

        let current: Vec<u32> = PageWindow::new(3, 10, 200)
            .links()
            .into_iter()
            .filter(|l| l.current)
            .map(|l| l.number)
            .collect();
        assert_eq!(current, vec![3]);
    }
}
