pub mod active_stream;
pub mod correlation_engine;
pub mod severity;
pub mod triage_location;

pub use active_stream::{evidence_streams, issue_stream, resolve_active_stream};
pub use correlation_engine::{
    filter_flows, filter_issues, issue_matches, issue_types, severity_by_flow, FlowQuery, FlowRow,
    TriageFilter, TriageView,
};
pub use severity::{severity_band, severity_label, SeverityBand};
