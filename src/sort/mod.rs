pub mod packet_sort;

pub use packet_sort::{sort_packets, SortDirection, SortKey, SortState};
