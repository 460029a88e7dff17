use crate::config::ViewConfig;
use crate::view::filters::{
    active_filter_pills, clear_filters, filters_to_query, read_filters, write_filters,
    EncodeOptions, FilterKey, FilterPill, PacketFilters, KEY_TAB,
};
use crate::view::location::Location;
use crate::view::pagination::{PageStatus, PageWindow};
use crate::view::quick_filter::{self, enforce_flag_invariant, FilterPatch};

/// Request for one page of the packets listing.
///
/// Also the identity of the fetch: a response whose query no longer equals
/// the view's current query is stale and must be ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PacketQuery {
    pub job_id: String,
    pub limit: u64,
    pub offset: u64,
    pub filters: PacketFilters,
}

impl PacketQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        params.extend(filters_to_query(&self.filters));
        params
    }

    pub fn is_current(&self, response_for: &PacketQuery) -> bool {
        self == response_for
    }
}

/// Page-level state for the packets tab, rebuilt from the location on every
/// navigation. Every transition returns the next location instead of
/// mutating this one.
#[derive(Debug, Clone)]
pub struct PacketsView {
    location: Location,
    filters: PacketFilters,
    window: PageWindow,
    tab: String,
}

impl PacketsView {
    pub fn from_location(location: Location, config: &ViewConfig) -> Self {
        let filters = read_filters(&location);
        let window = PageWindow::from_location(&location, config.page_size);
        Self {
            location,
            filters,
            window,
            tab: config.default_tab.clone(),
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn filters(&self) -> &PacketFilters {
        &self.filters
    }

    pub fn window(&self) -> PageWindow {
        self.window
    }

    pub fn pills(&self) -> Vec<FilterPill> {
        active_filter_pills(&self.filters)
    }

    pub fn status(&self, shown: u64, total: u64) -> PageStatus {
        self.window.status(shown, total)
    }

    pub fn packet_query(&self, job_id: impl Into<String>) -> PacketQuery {
        PacketQuery {
            job_id: job_id.into(),
            limit: self.window.page_size,
            offset: self.window.offset,
            filters: self.filters.clone(),
        }
    }

    fn encode(&self, filters: &PacketFilters, offset: u64) -> Location {
        let options = EncodeOptions::with_offset(offset).tab(self.tab.clone());
        write_filters(&self.location, filters, &options)
    }

    /// Applies the filter editor's draft and returns to the first page.
    pub fn apply_draft(&self, draft: PacketFilters) -> Location {
        self.encode(&enforce_flag_invariant(draft), 0)
    }

    pub fn reset(&self) -> Location {
        let mut next = clear_filters(&self.location);
        next.set(KEY_TAB, self.tab.as_str());
        next
    }

    pub fn remove_filter(&self, key: FilterKey) -> Location {
        self.encode(&quick_filter::remove(&self.filters, key), 0)
    }

    pub fn next_page(&self) -> Location {
        self.encode(&self.filters, self.window.next().offset)
    }

    pub fn prev_page(&self) -> Location {
        self.encode(&self.filters, self.window.prev().offset)
    }

    pub fn quick_filter(&self, patch: FilterPatch, replace: bool) -> Location {
        self.encode(&quick_filter::apply(&self.filters, patch, replace), 0)
    }

    /// Isolates one stream, discarding every other filter.
    pub fn select_stream(&self, stream_id: u64) -> Location {
        self.quick_filter(FilterPatch::stream(stream_id), true)
    }

    pub fn filter_source(&self, ip: &str) -> Location {
        self.quick_filter(FilterPatch::src_ip(ip), false)
    }

    pub fn filter_destination(&self, ip: &str) -> Location {
        self.quick_filter(FilterPatch::dst_ip(ip), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::filters::{Protocol, TcpFlag};
    use crate::view::pagination::current_offset;

    fn view(query: &str) -> PacketsView {
        PacketsView::from_location(Location::parse(query), &ViewConfig::default())
    }

    #[test]
    fn next_and_prev_keep_filters() {
        let v = view("src_ip=10.0.0.1&proto=TCP&flags=SYN&offset=200");
        let next = v.next_page();
        assert_eq!(current_offset(&next), 400);
        assert_eq!(read_filters(&next), *v.filters());
        assert_eq!(next.get("tab"), Some("packets"));

        let prev = view(&next.to_query_string()).prev_page();
        assert_eq!(current_offset(&prev), 200);
        assert_eq!(read_filters(&prev), *v.filters());
    }

    #[test]
    fn quick_filter_resets_offset() {
        let v = view("offset=600&dst_ip=10.0.0.9");
        let next = v.filter_source("10.0.0.1");
        assert_eq!(next.get("offset"), Some("0"));
        assert_eq!(next.get("src_ip"), Some("10.0.0.1"));
        assert_eq!(next.get("dst_ip"), Some("10.0.0.9"));
    }

    #[test]
    fn select_stream_replaces_filters() {
        let v = view("src_ip=10.0.0.1&proto=TCP&flags=SYN&pair=1&issue=3");
        let next = v.select_stream(17);
        let filters = read_filters(&next);
        assert_eq!(filters.stream.as_deref(), Some("17"));
        assert_eq!(filters.src_ip, None);
        assert!(!filters.pair);
        assert_eq!(next.get("issue"), Some("3"));
    }

    #[test]
    fn apply_draft_enforces_tcp_flags() {
        let v = view("offset=200");
        let draft = PacketFilters {
            proto: Some(Protocol::Udp),
            flags: Some([TcpFlag::Syn].into_iter().collect()),
            ..Default::default()
        };
        let next = v.apply_draft(draft);
        assert!(!next.contains("flags"));
        assert_eq!(next.get("proto"), Some("UDP"));
        assert_eq!(next.get("offset"), Some("0"));
    }

    #[test]
    fn reset_clears_and_sets_tab() {
        let next = view("src_ip=1.2.3.4&offset=400&issue=2").reset();
        assert_eq!(next.to_query_string(), "issue=2&tab=packets");
    }

    #[test]
    fn stale_responses_are_detected() {
        let v = view("src_ip=10.0.0.1");
        let in_flight = v.packet_query("7");
        let after_paging = view(&v.next_page().to_query_string()).packet_query("7");
        assert!(!after_paging.is_current(&in_flight));
        assert!(in_flight.is_current(&v.packet_query("7")));
        assert_eq!(
            in_flight.params(),
            vec![
                ("limit", "200".to_string()),
                ("offset", "0".to_string()),
                ("src_ip", "10.0.0.1".to_string()),
            ]
        );
    }
}
