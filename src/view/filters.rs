use crate::view::location::Location;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub const KEY_SRC_IP: &str = "src_ip";
pub const KEY_DST_IP: &str = "dst_ip";
pub const KEY_SRC_PORT: &str = "src_port";
pub const KEY_DST_PORT: &str = "dst_port";
pub const KEY_PROTO: &str = "proto";
pub const KEY_FLAGS: &str = "flags";
pub const KEY_STREAM: &str = "stream";
pub const KEY_PAIR: &str = "pair";
pub const KEY_TAB: &str = "tab";
pub const KEY_OFFSET: &str = "offset";

pub const FILTER_KEYS: [&str; 8] = [
    KEY_SRC_IP,
    KEY_DST_IP,
    KEY_SRC_PORT,
    KEY_DST_PORT,
    KEY_PROTO,
    KEY_FLAGS,
    KEY_STREAM,
    KEY_PAIR,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TCP" => Ok(Protocol::Tcp),
            "UDP" => Ok(Protocol::Udp),
            _ => Err(()),
        }
    }
}

/// TCP header flags, ordered the way they are written back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TcpFlag {
    Syn,
    Ack,
    Fin,
    Rst,
    Psh,
    Urg,
}

impl TcpFlag {
    pub const ALL: [TcpFlag; 6] = [
        TcpFlag::Syn,
        TcpFlag::Ack,
        TcpFlag::Fin,
        TcpFlag::Rst,
        TcpFlag::Psh,
        TcpFlag::Urg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TcpFlag::Syn => "SYN",
            TcpFlag::Ack => "ACK",
            TcpFlag::Fin => "FIN",
            TcpFlag::Rst => "RST",
            TcpFlag::Psh => "PSH",
            TcpFlag::Urg => "URG",
        }
    }
}

impl fmt::Display for TcpFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TcpFlag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        TcpFlag::ALL
            .iter()
            .copied()
            .find(|flag| flag.as_str() == upper)
            .ok_or(())
    }
}

/// Typed packet filter set, the decoded form of the location's filter keys.
///
/// Port and stream values stay opaque strings; numeric interpretation
/// happens where they are consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PacketFilters {
    pub src_ip: Option<String>,
    pub dst_ip: Option<String>,
    pub src_port: Option<String>,
    pub dst_port: Option<String>,
    pub proto: Option<Protocol>,
    pub flags: Option<BTreeSet<TcpFlag>>,
    pub stream: Option<String>,
    pub pair: bool,
}

impl PacketFilters {
    /// Drops empty strings and empty flag sets, and clears flags unless the
    /// protocol is TCP.
    pub fn normalized(mut self) -> Self {
        for field in [
            &mut self.src_ip,
            &mut self.dst_ip,
            &mut self.src_port,
            &mut self.dst_port,
            &mut self.stream,
        ] {
            if field.as_deref().is_some_and(str::is_empty) {
                *field = None;
            }
        }
        if self.flags.as_ref().is_some_and(BTreeSet::is_empty) {
            self.flags = None;
        }
        if self.proto != Some(Protocol::Tcp) && self.flags.is_some() {
            log::debug!("dropping TCP flags for protocol {:?}", self.proto);
            self.flags = None;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == PacketFilters::default()
    }

    pub fn flags_value(&self) -> Option<String> {
        let flags = self.flags.as_ref().filter(|f| !f.is_empty())?;
        Some(
            flags
                .iter()
                .map(TcpFlag::as_str)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// Identifies one field of [`PacketFilters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    SrcIp,
    DstIp,
    SrcPort,
    DstPort,
    Proto,
    Flags,
    Stream,
    Pair,
}

impl FilterKey {
    pub fn query_key(&self) -> &'static str {
        match self {
            FilterKey::SrcIp => KEY_SRC_IP,
            FilterKey::DstIp => KEY_DST_IP,
            FilterKey::SrcPort => KEY_SRC_PORT,
            FilterKey::DstPort => KEY_DST_PORT,
            FilterKey::Proto => KEY_PROTO,
            FilterKey::Flags => KEY_FLAGS,
            FilterKey::Stream => KEY_STREAM,
            FilterKey::Pair => KEY_PAIR,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterKey::SrcIp => "Src IP",
            FilterKey::DstIp => "Dst IP",
            FilterKey::SrcPort => "Src Port",
            FilterKey::DstPort => "Dst Port",
            FilterKey::Proto => "Protocol",
            FilterKey::Flags => "Flags",
            FilterKey::Stream => "Stream",
            FilterKey::Pair => "Pair",
        }
    }
}

impl FromStr for FilterKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            KEY_SRC_IP => Ok(FilterKey::SrcIp),
            KEY_DST_IP => Ok(FilterKey::DstIp),
            KEY_SRC_PORT => Ok(FilterKey::SrcPort),
            KEY_DST_PORT => Ok(FilterKey::DstPort),
            KEY_PROTO => Ok(FilterKey::Proto),
            KEY_FLAGS => Ok(FilterKey::Flags),
            KEY_STREAM => Ok(FilterKey::Stream),
            KEY_PAIR => Ok(FilterKey::Pair),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub tab: Option<String>,
    pub offset: Option<u64>,
}

impl EncodeOptions {
    pub fn with_offset(offset: u64) -> Self {
        Self {
            tab: None,
            offset: Some(offset),
        }
    }

    pub fn tab(mut self, tab: impl Into<String>) -> Self {
        self.tab = Some(tab.into());
        self
    }
}

fn read_text(location: &Location, key: &str) -> Option<String> {
    location
        .get(key)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn read_flags(location: &Location) -> Option<BTreeSet<TcpFlag>> {
    let raw = location.get(KEY_FLAGS).filter(|v| !v.is_empty())?;
    let mut flags = BTreeSet::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.parse::<TcpFlag>() {
            Ok(flag) => {
                flags.insert(flag);
            }
            Err(()) => log::debug!("ignoring unknown TCP flag {:?}", token),
        }
    }
    if flags.is_empty() { None } else { Some(flags) }
}

/// Decodes the filter keys of `location`. Never fails.
pub fn read_filters(location: &Location) -> PacketFilters {
    let proto = location
        .get(KEY_PROTO)
        .filter(|v| !v.is_empty())
        .and_then(|raw| match raw.parse::<Protocol>() {
            Ok(proto) => Some(proto),
            Err(()) => {
                log::debug!("ignoring unknown protocol {:?}", raw);
                None
            }
        });
    let pair = matches!(location.get(KEY_PAIR), Some("1") | Some("true"));

    PacketFilters {
        src_ip: read_text(location, KEY_SRC_IP),
        dst_ip: read_text(location, KEY_DST_IP),
        src_port: read_text(location, KEY_SRC_PORT),
        dst_port: read_text(location, KEY_DST_PORT),
        proto,
        flags: read_flags(location),
        stream: read_text(location, KEY_STREAM),
        pair,
    }
    .normalized()
}

fn write_text(target: &mut Location, key: &str, value: Option<&str>) {
    match value.filter(|v| !v.is_empty()) {
        Some(value) => target.set(key, value),
        None => target.delete(key),
    }
}

/// Rewrites every filter key of `current` from `filters`.
///
/// `offset` is written when given and deleted otherwise, so a filter change
/// without an explicit offset lands on the first page.
pub fn write_filters(current: &Location, filters: &PacketFilters, options: &EncodeOptions) -> Location {
    let filters = filters.clone().normalized();
    let mut next = current.clone();

    if let Some(tab) = options.tab.as_deref().filter(|t| !t.is_empty()) {
        next.set(KEY_TAB, tab);
    }
    match options.offset {
        Some(offset) => next.set(KEY_OFFSET, offset.to_string()),
        None => next.delete(KEY_OFFSET),
    }

    write_text(&mut next, KEY_SRC_IP, filters.src_ip.as_deref());
    write_text(&mut next, KEY_DST_IP, filters.dst_ip.as_deref());
    write_text(&mut next, KEY_SRC_PORT, filters.src_port.as_deref());
    write_text(&mut next, KEY_DST_PORT, filters.dst_port.as_deref());
    write_text(&mut next, KEY_PROTO, filters.proto.map(|p| p.as_str()));
    write_text(&mut next, KEY_STREAM, filters.stream.as_deref());
    write_text(&mut next, KEY_FLAGS, filters.flags_value().as_deref());
    if filters.pair {
        next.set(KEY_PAIR, "1");
    } else {
        next.delete(KEY_PAIR);
    }
    next
}

/// Deletes every filter key and the offset; `tab` and unknown keys stay.
pub fn clear_filters(current: &Location) -> Location {
    let mut next = current.clone();
    for key in FILTER_KEYS {
        next.delete(key);
    }
    next.delete(KEY_OFFSET);
    next
}

/// Request parameters for the packets listing.
pub fn filters_to_query(filters: &PacketFilters) -> Vec<(&'static str, String)> {
    let filters = filters.clone().normalized();
    let flags = filters.flags_value();
    let mut params = Vec::new();
    if let Some(v) = filters.src_ip {
        params.push((KEY_SRC_IP, v));
    }
    if let Some(v) = filters.dst_ip {
        params.push((KEY_DST_IP, v));
    }
    if let Some(v) = filters.src_port {
        params.push((KEY_SRC_PORT, v));
    }
    if let Some(v) = filters.dst_port {
        params.push((KEY_DST_PORT, v));
    }
    if let Some(p) = filters.proto {
        params.push((KEY_PROTO, p.as_str().to_string()));
    }
    if let Some(v) = filters.stream {
        params.push((KEY_STREAM, v));
    }
    if let Some(v) = flags {
        params.push((KEY_FLAGS, v));
    }
    if filters.pair {
        params.push((KEY_PAIR, "1".to_string()));
    }
    params
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPill {
    pub key: FilterKey,
    pub label: &'static str,
    pub value: String,
}

/// Removable pills for the active filters bar. `pair` has no pill.
pub fn active_filter_pills(filters: &PacketFilters) -> Vec<FilterPill> {
    let mut pills = Vec::new();
    let mut push = |key: FilterKey, value: Option<String>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            pills.push(FilterPill {
                key,
                label: key.label(),
                value,
            });
        }
    };
    push(FilterKey::SrcIp, filters.src_ip.clone());
    push(FilterKey::DstIp, filters.dst_ip.clone());
    push(FilterKey::SrcPort, filters.src_port.clone());
    push(FilterKey::DstPort, filters.dst_port.clone());
    push(FilterKey::Proto, filters.proto.map(|p| p.as_str().to_string()));
    push(
        FilterKey::Flags,
        filters.flags.as_ref().map(|flags| {
            flags
                .iter()
                .map(TcpFlag::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }),
    );
    push(FilterKey::Stream, filters.stream.clone());
    pills
}
