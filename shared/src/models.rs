use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    pub id: u64,
    pub protocol: String,
    pub client_ip: String,
    pub client_port: u16,
    pub server_ip: String,
    pub server_port: u16,
    #[serde(default)]
    pub start_ts: Option<String>,
    #[serde(default)]
    pub end_ts: Option<String>,
    #[serde(default)]
    pub tcp_stream: Option<u64>,
    #[serde(default)]
    pub handshake_rtt_ms_estimate: Option<f64>,
    #[serde(default)]
    pub tcp_retransmissions: u64,
    #[serde(default)]
    pub dup_acks: u64,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub bytes_client_to_server: u64,
    #[serde(default)]
    pub bytes_server_to_client: u64,
    #[serde(default)]
    pub packet_count: u64,
}

impl FlowSummary {
    pub fn endpoint(&self) -> String {
        format!(
            "{}:{} → {}:{}",
            self.client_ip, self.client_port, self.server_ip, self.server_port
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub issue_type: String,
    #[serde(default)]
    pub severity: u32,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub primary_flow_id: Option<u64>,
    #[serde(default)]
    pub primary_flow: Option<FlowSummary>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpFlagBits {
    #[serde(rename = "SYN", default)]
    pub syn: bool,
    #[serde(rename = "ACK", default)]
    pub ack: bool,
    #[serde(rename = "FIN", default)]
    pub fin: bool,
    #[serde(rename = "RST", default)]
    pub rst: bool,
    #[serde(rename = "PSH", default)]
    pub psh: bool,
    #[serde(rename = "URG", default)]
    pub urg: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    pub index: u64,
    pub timestamp: String,
    #[serde(default)]
    pub protocol: String,
    #[serde(default)]
    pub src_ip: String,
    #[serde(default)]
    pub dst_ip: String,
    #[serde(default)]
    pub src_port: u16,
    #[serde(default)]
    pub dst_port: u16,
    #[serde(default)]
    pub length: u32,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub error_tags: Vec<String>,
    #[serde(default)]
    pub stream_id: Option<u64>,
    #[serde(default)]
    pub tcp_flags: TcpFlagBits,
    #[serde(default)]
    pub seq: u64,
    #[serde(default)]
    pub ack: u64,
    #[serde(default)]
    pub window: u32,
    #[serde(default)]
    pub tls_sni: Option<String>,
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub http_host: Option<String>,
}

/// One page of the packets listing, as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PacketPage {
    #[serde(default)]
    pub packets: Vec<Packet>,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEndpoint {
    pub id: u64,
    #[serde(default)]
    pub protocol: String,
    pub client_ip: String,
    pub client_port: u16,
    pub server_ip: String,
    pub server_port: u16,
    #[serde(default)]
    pub tcp_stream: Option<u64>,
}

impl FlowEndpoint {
    pub fn endpoint(&self) -> String {
        format!(
            "{}:{} → {}:{}",
            self.client_ip, self.client_port, self.server_ip, self.server_port
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(default)]
    pub flow_id: Option<u64>,
    pub packet_start_index: u64,
    pub packet_end_index: u64,
    #[serde(default)]
    pub flow: Option<FlowEndpoint>,
    #[serde(default)]
    pub metrics: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueDetail {
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

lazy_static! {
    static ref ERROR_TAG_LABELS: HashMap<&'static str, &'static str> = {
        let mut labels = HashMap::new();
        labels.insert("rst", "RST");
        labels.insert("tls_alert", "TLS Alert");
        labels.insert("syn_retransmission", "SYN Retrans");
        labels.insert("retransmission", "Retransmission");
        labels.insert("dup_ack", "Dup ACK");
        labels
    };
}

/// Human label for a packet error tag; unknown tags are shown as-is.
pub fn error_tag_label(tag: &str) -> &str {
    ERROR_TAG_LABELS.get(tag).copied().unwrap_or(tag)
}

/// Compact status for a packet row: the first label, plus a count of the rest.
pub fn status_label(tags: &[String]) -> Option<String> {
    let (first, rest) = tags.split_first()?;
    let primary = error_tag_label(first);
    if rest.is_empty() {
        Some(primary.to_string())
    } else {
        Some(format!("{} +{}", primary, rest.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_label_counts_extra_tags() {
        assert_eq!(status_label(&[]), None);
        assert_eq!(status_label(&["rst".to_string()]), Some("RST".to_string()));
        assert_eq!(
            status_label(&["dup_ack".to_string(), "weird".to_string(), "rst".to_string()]),
            Some("Dup ACK +2".to_string())
        );
        assert_eq!(error_tag_label("weird"), "weird");
    }

    #[test]
    fn packet_deserializes_with_missing_optionals() {
        let json = r#"{"index": 4, "timestamp": "2024-01-01T00:00:00Z", "length": 60,
            "tcp_flags": {"SYN": true, "ACK": false, "FIN": false, "RST": false, "PSH": false, "URG": false}}"#;
        let packet: Packet = serde_json::from_str(json).unwrap();
        assert_eq!(packet.index, 4);
        assert_eq!(packet.stream_id, None);
        assert!(packet.error_tags.is_empty());
        assert!(packet.tcp_flags.syn);
    }

    #[test]
    fn issue_reads_backend_field_names() {
        let json = r#"{"id": 9, "issue_type": "handshake_timeout", "severity": 4,
            "title": "Slow handshake", "summary": "", "primary_flow_id": 12}"#;
        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.primary_flow_id, Some(12));
        assert!(issue.primary_flow.is_none());
    }
}
