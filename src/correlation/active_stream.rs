use shared::{Issue, IssueDetail, Packet};
use std::collections::BTreeSet;

/// Stream the packet viewer should show details for.
///
/// An explicit, numeric `stream` filter wins. Otherwise the displayed page
/// decides: if every packet that carries a stream id carries the same one,
/// that stream is active. Mixed or missing ids resolve to nothing.
pub fn resolve_active_stream(explicit: Option<&str>, packets: &[Packet]) -> Option<u64> {
    if let Some(raw) = explicit {
        match raw.trim().parse::<u64>() {
            Ok(stream) => return Some(stream),
            Err(_) => log::debug!("stream filter {:?} is not numeric, inspecting page", raw),
        }
    }

    let ids: BTreeSet<u64> = packets.iter().filter_map(|p| p.stream_id).collect();
    if ids.len() == 1 {
        ids.into_iter().next()
    } else {
        log::trace!("no single stream on page ({} distinct)", ids.len());
        None
    }
}

pub fn issue_stream(issue: &Issue) -> Option<u64> {
    issue.primary_flow.as_ref().and_then(|flow| flow.tcp_stream)
}

/// Distinct streams referenced by an issue's evidence, in evidence order.
pub fn evidence_streams(detail: &IssueDetail) -> Vec<u64> {
    let mut seen = BTreeSet::new();
    detail
        .evidence
        .iter()
        .filter_map(|ev| ev.flow.as_ref().and_then(|flow| flow.tcp_stream))
        .filter(|stream| seen.insert(*stream))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Evidence, FlowEndpoint, TcpFlagBits};

    fn packets(streams: &[Option<u64>]) -> Vec<Packet> {
        streams
            .iter()
            .enumerate()
            .map(|(i, stream)| Packet {
                index: i as u64 + 1,
                timestamp: "2024-05-01T10:00:00Z".into(),
                protocol: "TCP".into(),
                src_ip: "10.0.0.1".into(),
                dst_ip: "10.0.0.2".into(),
                src_port: 50000,
                dst_port: 443,
                length: 60,
                info: String::new(),
                error_tags: Vec::new(),
                stream_id: *stream,
                tcp_flags: TcpFlagBits::default(),
                seq: 0,
                ack: 0,
                window: 0,
                tls_sni: None,
                http_method: None,
                http_host: None,
            })
            .collect()
    }

    #[test]
    fn unanimous_page_resolves() {
        assert_eq!(resolve_active_stream(None, &packets(&[Some(3), Some(3), Some(3)])), Some(3));
        assert_eq!(resolve_active_stream(None, &packets(&[Some(3), None, Some(3)])), Some(3));
    }

    #[test]
    fn mixed_or_empty_page_resolves_to_none() {
        assert_eq!(resolve_active_stream(None, &packets(&[Some(3), Some(4)])), None);
        assert_eq!(resolve_active_stream(None, &packets(&[None, None])), None);
        assert_eq!(resolve_active_stream(None, &[]), None);
    }

    #[test]
    fn explicit_filter_wins() {
        assert_eq!(resolve_active_stream(Some("7"), &packets(&[Some(3), Some(3)])), Some(7));
    }

    #[test]
    fn non_numeric_filter_falls_back_to_page() {
        assert_eq!(resolve_active_stream(Some("abc"), &packets(&[Some(3)])), Some(3));
        assert_eq!(resolve_active_stream(Some("-1"), &packets(&[Some(3), Some(5)])), None);
    }

    #[test]
    fn evidence_streams_are_distinct() {
        let endpoint = |stream| FlowEndpoint {
            id: 1,
            protocol: "TCP".into(),
            client_ip: "10.0.0.1".into(),
            client_port: 1000,
            server_ip: "10.0.0.2".into(),
            server_port: 80,
            tcp_stream: stream,
        };
        let evidence = |stream| Evidence {
            flow_id: Some(1),
            packet_start_index: 1,
            packet_end_index: 5,
            flow: Some(endpoint(stream)),
            metrics: None,
        };
        let detail = IssueDetail {
            evidence: vec![evidence(Some(4)), evidence(None), evidence(Some(2)), evidence(Some(4))],
        };
        assert_eq!(evidence_streams(&detail), vec![4, 2]);
    }
}
