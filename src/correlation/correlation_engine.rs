use crate::correlation::severity::{severity_band, SeverityBand};
use shared::{FlowSummary, Issue};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Client-side filters of the triage view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriageFilter {
    pub issue_type: Option<String>,
    pub severity: Option<SeverityBand>,
    /// Raw stream filter text. The flow list is already narrowed to this
    /// stream by the backend; issues follow through their primary flow.
    pub stream: Option<String>,
}

impl TriageFilter {
    fn issue_type(&self) -> Option<&str> {
        self.issue_type.as_deref().filter(|t| !t.is_empty())
    }

    pub fn has_issue_predicate(&self) -> bool {
        self.issue_type().is_some() || self.severity.is_some()
    }

    pub fn stream_active(&self) -> bool {
        self.stream.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Distinct issue types, sorted.
pub fn issue_types(issues: &[Issue]) -> Vec<String> {
    issues
        .iter()
        .map(|issue| issue.issue_type.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Highest issue severity per primary flow id. Severity 0 carries no band
/// and never creates an entry.
pub fn severity_by_flow(issues: &[Issue]) -> BTreeMap<u64, u32> {
    let mut by_flow: BTreeMap<u64, u32> = BTreeMap::new();
    for issue in issues {
        let Some(flow_id) = issue.primary_flow_id else {
            continue;
        };
        if issue.severity == 0 {
            continue;
        }
        let entry = by_flow.entry(flow_id).or_insert(issue.severity);
        if issue.severity > *entry {
            *entry = issue.severity;
        }
    }
    by_flow
}

/// Type and severity predicate; the stream filter is not considered here.
pub fn issue_matches(issue: &Issue, filter: &TriageFilter) -> bool {
    if let Some(issue_type) = filter.issue_type() {
        if issue.issue_type != issue_type {
            return false;
        }
    }
    if let Some(band) = filter.severity {
        if severity_band(Some(issue.severity)) != Some(band) {
            return false;
        }
    }
    true
}

/// Flows kept by the type/severity filters: with either active, only flows
/// that are the primary flow of a matching issue.
pub fn filter_flows<'a>(issues: &[Issue], flows: &'a [FlowSummary], filter: &TriageFilter) -> Vec<&'a FlowSummary> {
    if !filter.has_issue_predicate() {
        return flows.iter().collect();
    }
    let flagged: HashSet<u64> = issues
        .iter()
        .filter(|issue| issue_matches(issue, filter))
        .filter_map(|issue| issue.primary_flow_id)
        .collect();
    flows.iter().filter(|flow| flagged.contains(&flow.id)).collect()
}

/// Issues kept by the filters. With a stream filter, an issue also needs its
/// primary flow among `visible_flows`.
pub fn filter_issues<'a>(issues: &'a [Issue], visible_flows: &[&FlowSummary], filter: &TriageFilter) -> Vec<&'a Issue> {
    let visible: Option<HashSet<u64>> = filter
        .stream_active()
        .then(|| visible_flows.iter().map(|flow| flow.id).collect());

    issues
        .iter()
        .filter(|issue| issue_matches(issue, filter))
        .filter(|issue| match &visible {
            Some(ids) => issue.primary_flow_id.is_some_and(|id| ids.contains(&id)),
            None => true,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowRow<'a> {
    pub flow: &'a FlowSummary,
    pub max_severity: Option<u32>,
}

impl FlowRow<'_> {
    pub fn band(&self) -> Option<SeverityBand> {
        severity_band(self.max_severity)
    }
}

/// Every derived projection of the triage page for one render.
#[derive(Debug, Clone)]
pub struct TriageView<'a> {
    pub issue_types: Vec<String>,
    pub severity_by_flow: BTreeMap<u64, u32>,
    pub issues: Vec<&'a Issue>,
    pub flows: Vec<FlowRow<'a>>,
}

impl<'a> TriageView<'a> {
    pub fn build(issues: &'a [Issue], flows: &'a [FlowSummary], filter: &TriageFilter) -> Self {
        let by_flow = severity_by_flow(issues);
        let visible_flows = filter_flows(issues, flows, filter);
        let visible_issues = filter_issues(issues, &visible_flows, filter);
        log::trace!(
            "triage view: {}/{} issues, {}/{} flows",
            visible_issues.len(),
            issues.len(),
            visible_flows.len(),
            flows.len()
        );

        let rows = visible_flows
            .into_iter()
            .map(|flow| FlowRow {
                flow,
                max_severity: by_flow.get(&flow.id).copied(),
            })
            .collect();

        Self {
            issue_types: issue_types(issues),
            severity_by_flow: by_flow,
            issues: visible_issues,
            flows: rows,
        }
    }

    pub fn find_issue(&self, id: u64) -> Option<&'a Issue> {
        self.issues.iter().copied().find(|issue| issue.id == id)
    }
}

/// Backend request for the triage flow list. Only numeric port and stream
/// values are sent; the row limit is attached when any filter is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FlowQuery {
    pub client_ip: Option<String>,
    pub server_ip: Option<String>,
    pub port: Option<u16>,
    pub tcp_stream: Option<u64>,
    pub limit: Option<u32>,
}

impl FlowQuery {
    pub fn from_inputs(client_ip: &str, server_ip: &str, port: &str, stream: &str, limit: u32) -> Self {
        let text = |v: &str| Some(v.trim()).filter(|v| !v.is_empty()).map(str::to_string);
        let mut query = Self {
            client_ip: text(client_ip),
            server_ip: text(server_ip),
            port: port.trim().parse().ok(),
            tcp_stream: stream.trim().parse().ok(),
            limit: None,
        };
        if query != Self::default() {
            query.limit = Some(limit);
        }
        query
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(v) = &self.client_ip {
            params.push(("client_ip", v.clone()));
        }
        if let Some(v) = &self.server_ip {
            params.push(("server_ip", v.clone()));
        }
        if let Some(v) = self.port {
            params.push(("port", v.to_string()));
        }
        if let Some(v) = self.tcp_stream {
            params.push(("tcp_stream", v.to_string()));
        }
        if let Some(v) = self.limit {
            params.push(("limit", v.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(id: u64, stream: Option<u64>) -> FlowSummary {
        FlowSummary {
            id,
            protocol: "TCP".into(),
            client_ip: "10.0.0.1".into(),
            client_port: 40000 + id as u16,
            server_ip: "10.0.0.2".into(),
            server_port: 443,
            start_ts: None,
            end_ts: None,
            tcp_stream: stream,
            handshake_rtt_ms_estimate: None,
            tcp_retransmissions: 0,
            dup_acks: 0,
            duration_ms: None,
            bytes_client_to_server: 0,
            bytes_server_to_client: 0,
            packet_count: 0,
        }
    }

    fn issue(id: u64, issue_type: &str, severity: u32, flow_id: Option<u64>) -> Issue {
        Issue {
            id,
            issue_type: issue_type.into(),
            severity,
            title: format!("issue {id}"),
            summary: String::new(),
            primary_flow_id: flow_id,
            primary_flow: None,
        }
    }

    fn fixture() -> (Vec<Issue>, Vec<FlowSummary>) {
        let issues = vec![
            issue(1, "retransmissions", 2, Some(10)),
            issue(2, "handshake_timeout", 5, Some(10)),
            issue(3, "tls_alert", 4, Some(11)),
            issue(4, "retransmissions", 1, Some(12)),
            issue(5, "dns_failure", 3, None),
        ];
        let flows = vec![flow(10, Some(0)), flow(11, Some(1)), flow(12, Some(2)), flow(13, Some(3))];
        (issues, flows)
    }

    #[test]
    fn issue_types_are_distinct_and_sorted() {
        let (issues, _) = fixture();
        assert_eq!(
            issue_types(&issues),
            vec!["dns_failure", "handshake_timeout", "retransmissions", "tls_alert"]
        );
        assert!(issue_types(&[]).is_empty());
    }

    #[test]
    fn severity_roll_up_keeps_maximum() {
        let (issues, _) = fixture();
        let by_flow = severity_by_flow(&issues);
        assert_eq!(by_flow.get(&10), Some(&5));
        assert_eq!(by_flow.get(&11), Some(&4));
        assert_eq!(by_flow.get(&12), Some(&1));
        assert_eq!(by_flow.len(), 3);
    }

    #[test]
    fn zero_severity_issues_leave_flow_unranked() {
        let (mut issues, flows) = fixture();
        issues.push(issue(9, "info", 0, Some(13)));
        issues.push(issue(10, "info", 0, Some(12)));
        let by_flow = severity_by_flow(&issues);
        assert_eq!(by_flow.get(&13), None);
        assert_eq!(by_flow.get(&12), Some(&1));

        let view = TriageView::build(&issues, &flows, &TriageFilter::default());
        let row = view.flows.iter().find(|row| row.flow.id == 13).unwrap();
        assert_eq!(row.max_severity, None);
    }

    #[test]
    fn no_filters_keeps_everything() {
        let (issues, flows) = fixture();
        let view = TriageView::build(&issues, &flows, &TriageFilter::default());
        assert_eq!(view.issues.len(), 5);
        assert_eq!(view.flows.len(), 4);
        assert_eq!(view.flows[3].max_severity, None);
        assert_eq!(view.flows[0].band(), Some(SeverityBand::High));
    }

    #[test]
    fn type_filter_narrows_issues_and_flows() {
        let (issues, flows) = fixture();
        let filter = TriageFilter {
            issue_type: Some("retransmissions".into()),
            ..Default::default()
        };
        let view = TriageView::build(&issues, &flows, &filter);
        let issue_ids: Vec<u64> = view.issues.iter().map(|i| i.id).collect();
        let flow_ids: Vec<u64> = view.flows.iter().map(|r| r.flow.id).collect();
        assert_eq!(issue_ids, vec![1, 4]);
        assert_eq!(flow_ids, vec![10, 12]);
        // roll-up still spans all issues of the flow
        assert_eq!(view.flows[0].max_severity, Some(5));
    }

    #[test]
    fn severity_filter_uses_bands() {
        let (issues, flows) = fixture();
        let filter = TriageFilter {
            severity: Some(SeverityBand::Med),
            ..Default::default()
        };
        let view = TriageView::build(&issues, &flows, &filter);
        let issue_ids: Vec<u64> = view.issues.iter().map(|i| i.id).collect();
        assert_eq!(issue_ids, vec![1, 5]);
        assert_eq!(view.flows.len(), 1);
        assert_eq!(view.flows[0].flow.id, 10);
    }

    #[test]
    fn stream_filter_goes_through_flows() {
        let (issues, flows) = fixture();
        // backend already narrowed the flow list to stream 1
        let narrowed = vec![flows[1].clone()];
        let filter = TriageFilter {
            stream: Some("1".into()),
            ..Default::default()
        };
        let view = TriageView::build(&issues, &narrowed, &filter);
        let issue_ids: Vec<u64> = view.issues.iter().map(|i| i.id).collect();
        assert_eq!(issue_ids, vec![3]);
        assert!(view.find_issue(1).is_none());
    }

    #[test]
    fn stream_filter_with_no_flows_yields_no_issues() {
        let (issues, _) = fixture();
        let filter = TriageFilter {
            stream: Some("99".into()),
            ..Default::default()
        };
        let view = TriageView::build(&issues, &[], &filter);
        assert!(view.issues.is_empty());
        assert!(view.flows.is_empty());
        assert_eq!(view.issue_types.len(), 4);
    }

    #[test]
    fn empty_inputs_degrade_to_empty_views() {
        let view = TriageView::build(&[], &[], &TriageFilter::default());
        assert!(view.issues.is_empty());
        assert!(view.flows.is_empty());
        assert!(view.severity_by_flow.is_empty());
    }

    #[test]
    fn flow_query_only_sends_numeric_values() {
        let query = FlowQuery::from_inputs(" 10.0.0.1 ", "", "https", "7", 500);
        assert_eq!(
            query.params(),
            vec![
                ("client_ip", "10.0.0.1".to_string()),
                ("tcp_stream", "7".to_string()),
                ("limit", "500".to_string()),
            ]
        );
        assert!(FlowQuery::from_inputs("", "", "abc", "", 500).params().is_empty());
    }
}
