//! View-state and correlation layer for the packet/flow diagnostics
//! dashboard.
//!
//! The current view lives entirely in a [`Location`] (a query string). The
//! filter codec and pagination controller read and rewrite it, quick filters
//! turn a clicked cell into the next location, and the correlation engine
//! derives the triage projections from freshly fetched issues and flows.
//! Nothing here performs I/O or keeps state between navigations.

pub mod config;
pub mod correlation;
pub mod sort;
pub mod utils;
pub mod view;

pub use config::ViewConfig;
pub use correlation::{resolve_active_stream, SeverityBand, TriageFilter, TriageView};
pub use sort::{sort_packets, SortDirection, SortKey, SortState};
pub use view::{FilterPatch, Location, PacketFilters, PacketQuery, PacketsView};
