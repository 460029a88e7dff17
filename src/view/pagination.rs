use crate::view::filters::{read_filters, write_filters, EncodeOptions, KEY_OFFSET};
use crate::view::location::Location;

pub const PAGE_SIZE: u64 = 200;

/// Offset carried by `location`. Missing, non-numeric or negative values
/// read as 0.
pub fn current_offset(location: &Location) -> u64 {
    match location.get(KEY_OFFSET) {
        None | Some("") => 0,
        Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
            log::debug!("malformed offset {:?}, using 0", raw);
            0
        }),
    }
}

/// No upper clamp; gate the action with [`PageStatus::can_next`].
pub fn next_offset(offset: u64, page_size: u64) -> u64 {
    offset.saturating_add(page_size)
}

pub fn prev_offset(offset: u64, page_size: u64) -> u64 {
    offset.saturating_sub(page_size)
}

/// Re-encodes `location` at `offset`, keeping its active filters.
pub fn page_location(location: &Location, offset: u64, tab: Option<&str>) -> Location {
    let filters = read_filters(location);
    let mut options = EncodeOptions::with_offset(offset);
    options.tab = tab.map(str::to_string);
    write_filters(location, &filters, &options)
}

/// The visible slice of a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub page_size: u64,
}

impl PageWindow {
    pub fn new(offset: u64, page_size: u64) -> Self {
        Self {
            offset,
            page_size: page_size.max(1),
        }
    }

    pub fn from_location(location: &Location, page_size: u64) -> Self {
        Self::new(current_offset(location), page_size)
    }

    pub fn next(&self) -> Self {
        Self::new(next_offset(self.offset, self.page_size), self.page_size)
    }

    pub fn prev(&self) -> Self {
        Self::new(prev_offset(self.offset, self.page_size), self.page_size)
    }

    /// Status of this window given the shown row count and the backend total.
    pub fn status(&self, shown: u64, total: u64) -> PageStatus {
        let has_rows = total > 0;
        let end = self.offset.saturating_add(shown);
        PageStatus {
            can_prev: self.offset > 0,
            can_next: end < total,
            showing_start: if has_rows { self.offset.saturating_add(1) } else { 0 },
            showing_end: end,
            total_pages: if has_rows { total.div_ceil(self.page_size) } else { 0 },
            current_page: if has_rows { self.offset / self.page_size + 1 } else { 0 },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageStatus {
    pub can_prev: bool,
    pub can_next: bool,
    pub showing_start: u64,
    pub showing_end: u64,
    pub total_pages: u64,
    pub current_page: u64,
}
