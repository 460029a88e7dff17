pub mod filters;
pub mod location;
pub mod packets_view;
pub mod pagination;
pub mod quick_filter;

#[cfg(test)]
pub(crate) mod test_support;

pub use filters::{
    active_filter_pills, clear_filters, read_filters, write_filters, EncodeOptions, FilterKey,
    FilterPill, PacketFilters, Protocol, TcpFlag,
};
pub use location::Location;
pub use packets_view::{PacketQuery, PacketsView};
pub use pagination::{current_offset, next_offset, prev_offset, PageStatus, PageWindow, PAGE_SIZE};
pub use quick_filter::FilterPatch;
