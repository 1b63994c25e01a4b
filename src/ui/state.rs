use crate::common::{Page, PageRequest};

/// Page navigation for a paginated list. The page index is zero-based and
/// always kept inside `[0, total_pages - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: u32,
    size: u32,
    total_pages: u32,
}

impl Pager {
    pub fn new(size: u32) -> Self {
        Self {
            page: 0,
            size: size.max(1),
            total_pages: 1,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.size)
    }

    /// Takes the page count from a loaded page and re-clamps.
    pub fn sync<T>(&mut self, page: &Page<T>) {
        self.total_pages = page.total_pages.max(1);
        self.page = self.page.min(self.last_page());
    }

    pub fn next(&mut self) -> PageRequest {
        self.goto(self.page.saturating_add(1))
    }

    pub fn prev(&mut self) -> PageRequest {
        self.goto(self.page.saturating_sub(1))
    }

    pub fn goto(&mut self, page: u32) -> PageRequest {
        self.page = page.min(self.last_page());
        self.request()
    }

    /// Changing the page size starts over from the first page.
    pub fn set_size(&mut self, size: u32) -> PageRequest {
        self.size = size.max(1);
        self.page = 0;
        self.request()
    }

    pub fn has_next(&self) -> bool {
        self.page < self.last_page()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }

    fn last_page(&self) -> u32 {
        self.total_pages.saturating_sub(1)
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(PageRequest::DEFAULT_SIZE)
    }
}
