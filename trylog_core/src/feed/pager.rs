/// Items revealed per "show more", and the initial window.
pub const PAGE_SIZE: usize = 10;

/// Display window over an already fetched list. Growing the window never
/// fetches anything; consumers slice the list to [`FeedPager::visible_len`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPager {
    visible: usize,
}

impl Default for FeedPager {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedPager {
    pub fn new() -> Self {
        Self { visible: PAGE_SIZE }
    }

    pub fn visible_count(&self) -> usize {
        self.visible
    }

    /// Grows the window by one page, whether or not there is more to show.
    pub fn show_more(&mut self) {
        self.visible = self.visible.saturating_add(PAGE_SIZE);
    }

    pub fn reset(&mut self) {
        self.visible = PAGE_SIZE;
    }

    pub fn visible_len(&self, total: usize) -> usize {
        self.visible.min(total)
    }

    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[..self.visible_len(items.len())]
    }

    pub fn has_more(&self, total: usize) -> bool {
        self.visible < total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_one_page() {
        assert_eq!(FeedPager::new().visible_count(), 10);
    }

    #[test]
    fn test_show_more_grows_by_page() {
        let mut pager = FeedPager::new();
        pager.show_more();
        assert_eq!(pager.visible_count(), 20);

        for n in 2..=6 {
            pager.show_more();
            assert_eq!(pager.visible_count(), 10 + 10 * n);
        }
    }

    #[test]
    fn test_twenty_five_posts() {
        let posts: Vec<u32> = (0..25).collect();
        let mut pager = FeedPager::new();

        assert_eq!(pager.window(&posts).len(), 10);
        assert!(pager.has_more(posts.len()));

        pager.show_more();
        assert_eq!(pager.window(&posts).len(), 20);

        pager.show_more();
        assert_eq!(pager.window(&posts).len(), 25);
        assert_eq!(pager.window(&posts), &posts[..]);
        assert!(!pager.has_more(posts.len()));

        // Unclamped cursor, clamped display
        pager.show_more();
        assert_eq!(pager.visible_count(), 40);
        assert_eq!(pager.visible_len(posts.len()), 25);
    }

    #[test]
    fn test_reset_returns_to_first_page() {
        let mut pager = FeedPager::new();
        pager.show_more();
        pager.show_more();
        pager.reset();
        assert_eq!(pager, FeedPager::new());
    }

    #[test]
    fn test_empty_list() {
        let posts: Vec<u32> = Vec::new();
        let pager = FeedPager::new();
        assert!(pager.window(&posts).is_empty());
        assert!(!pager.has_more(0));
    }
}
