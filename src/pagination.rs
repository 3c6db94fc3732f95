use tracing::trace;

pub const DEFAULT_PAGE_CHUNK_SIZE: usize = 10;
pub const PAGE_CHUNK_SIZE_OPTIONS: [usize; 4] = [10, 15, 20, 30];

/// Splits rows into pages of `page_chunk_size`; only the last page may be
/// shorter. A size of 0 is treated as 1.
pub fn chunk<T>(rows: &[T], page_chunk_size: usize) -> Vec<&[T]> {
    rows.chunks(page_chunk_size.max(1)).collect()
}

/// The page at `page_index`, or an empty slice if there is no such page.
pub fn current_slice<'a, T>(chunks: &[&'a [T]], page_index: usize) -> &'a [T] {
    chunks.get(page_index).copied().unwrap_or(&[])
}

/// 1-based row number over the whole (filtered) table.
pub fn display_index(row_index_in_page: usize, page_chunk_size: usize, page_index: usize) -> usize {
    row_index_in_page + 1 + page_chunk_size * page_index
}

pub fn page_count(total: usize, page_chunk_size: usize) -> usize {
    total.div_ceil(page_chunk_size.max(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    chunk_size: usize,
    index: usize,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_CHUNK_SIZE)
    }
}

impl PageState {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            index: 0,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn page_count(&self, total: usize) -> usize {
        page_count(total, self.chunk_size)
    }

    fn last_index(&self, total: usize) -> usize {
        self.page_count(total).saturating_sub(1)
    }

    /// Pulls the index back into range after the row count changed.
    pub fn clamp(&mut self, total: usize) {
        let last = self.last_index(total);
        if self.index > last {
            trace!("Clamping page index {} to {}", self.index, last);
            self.index = last;
        }
    }

    /// Re-chunks with a new size and goes back to the first page.
    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = chunk_size.max(1);
        self.index = 0;
    }

    /// Jumps to `index`, clamped into range. Returns true if the page changed.
    pub fn set_index(&mut self, index: usize, total: usize) -> bool {
        let target = index.min(self.last_index(total));
        let changed = target != self.index;
        self.index = target;
        changed
    }

    pub fn can_go_previous(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_next(&self, total: usize) -> bool {
        self.index + 1 < self.page_count(total)
    }

    pub fn first(&mut self, total: usize) -> bool {
        self.set_index(0, total)
    }

    pub fn previous(&mut self, total: usize) -> bool {
        if !self.can_go_previous() {
            return false;
        }
        self.set_index(self.index - 1, total)
    }

    pub fn next(&mut self, total: usize) -> bool {
        if !self.can_go_next(total) {
            return false;
        }
        self.set_index(self.index + 1, total)
    }

    pub fn last(&mut self, total: usize) -> bool {
        self.set_index(self.last_index(total), total)
    }

    /// Position range `start..end` of the current page within `total` rows.
    pub fn bounds(&self, total: usize) -> std::ops::Range<usize> {
        let start = (self.index * self.chunk_size).min(total);
        let end = (start + self.chunk_size).min(total);
        start..end
    }

    /// 1-based `(first, last)` row numbers shown on the current page.
    pub fn range(&self, total: usize) -> (usize, usize) {
        let bounds = self.bounds(total);
        if bounds.is_empty() {
            (0, 0)
        } else {
            (bounds.start + 1, bounds.end)
        }
    }

    pub fn range_label(&self, total: usize) -> String {
        let (first, last) = self.range(total);
        format!("{first} - {last} of {total}")
    }

    /// The next entry of [`PAGE_CHUNK_SIZE_OPTIONS`], wrapping around.
    pub fn next_size_option(&self, step: isize) -> usize {
        let options = PAGE_CHUNK_SIZE_OPTIONS;
        let current = options
            .iter()
            .position(|&size| size == self.chunk_size)
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(options.len() as isize) as usize;
        options[next]
    }
}
