use crate::view::filters::{FilterKey, PacketFilters, Protocol, TcpFlag};
use std::collections::BTreeSet;

/// Partial filter change requested from a data cell. `None` fields leave
/// the current value alone when merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub src_ip: Option<String>,
    pub dst_ip: Option<String>,
    pub src_port: Option<String>,
    pub dst_port: Option<String>,
    pub proto: Option<Protocol>,
    pub flags: Option<BTreeSet<TcpFlag>>,
    pub stream: Option<String>,
    pub pair: Option<bool>,
}

impl FilterPatch {
    pub fn src_ip(ip: impl Into<String>) -> Self {
        Self {
            src_ip: Some(ip.into()),
            ..Default::default()
        }
    }

    pub fn dst_ip(ip: impl Into<String>) -> Self {
        Self {
            dst_ip: Some(ip.into()),
            ..Default::default()
        }
    }

    pub fn stream(stream_id: u64) -> Self {
        Self {
            stream: Some(stream_id.to_string()),
            ..Default::default()
        }
    }

    /// Sets one field from its query-key spelling. Unparsable protocol or
    /// flag values leave the patch unchanged and return `false`.
    pub fn set(&mut self, key: FilterKey, value: &str) -> bool {
        match key {
            FilterKey::SrcIp => self.src_ip = Some(value.to_string()),
            FilterKey::DstIp => self.dst_ip = Some(value.to_string()),
            FilterKey::SrcPort => self.src_port = Some(value.to_string()),
            FilterKey::DstPort => self.dst_port = Some(value.to_string()),
            FilterKey::Stream => self.stream = Some(value.to_string()),
            FilterKey::Pair => self.pair = Some(matches!(value, "1" | "true")),
            FilterKey::Proto => match value.parse() {
                Ok(proto) => self.proto = Some(proto),
                Err(()) => return false,
            },
            FilterKey::Flags => {
                let parsed: Result<BTreeSet<TcpFlag>, ()> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(|t| t.parse::<TcpFlag>())
                    .collect();
                match parsed {
                    Ok(flags) => self.flags = Some(flags),
                    Err(()) => return false,
                }
            }
        }
        true
    }

    fn into_filters(self) -> PacketFilters {
        PacketFilters {
            src_ip: self.src_ip,
            dst_ip: self.dst_ip,
            src_port: self.src_port,
            dst_port: self.dst_port,
            proto: self.proto,
            flags: self.flags,
            stream: self.stream,
            pair: self.pair.unwrap_or(false),
        }
    }
}

/// Clears `flags` whenever the protocol is not TCP.
pub fn enforce_flag_invariant(mut filters: PacketFilters) -> PacketFilters {
    if filters.proto != Some(Protocol::Tcp) && filters.flags.take().is_some() {
        log::debug!("quick filter cleared flags for non-TCP protocol");
    }
    filters
}

/// Merges `patch` over `current`, or with `replace` uses `patch` alone.
pub fn apply(current: &PacketFilters, patch: FilterPatch, replace: bool) -> PacketFilters {
    let merged = if replace {
        patch.into_filters()
    } else {
        let mut next = current.clone();
        if let Some(v) = patch.src_ip {
            next.src_ip = Some(v);
        }
        if let Some(v) = patch.dst_ip {
            next.dst_ip = Some(v);
        }
        if let Some(v) = patch.src_port {
            next.src_port = Some(v);
        }
        if let Some(v) = patch.dst_port {
            next.dst_port = Some(v);
        }
        if let Some(v) = patch.proto {
            next.proto = Some(v);
        }
        if let Some(v) = patch.flags {
            next.flags = Some(v);
        }
        if let Some(v) = patch.stream {
            next.stream = Some(v);
        }
        if let Some(v) = patch.pair {
            next.pair = v;
        }
        next
    };
    enforce_flag_invariant(merged).normalized()
}

/// Removes exactly one field; `Flags` drops the whole set.
pub fn remove(current: &PacketFilters, key: FilterKey) -> PacketFilters {
    let mut next = current.clone();
    match key {
        FilterKey::SrcIp => next.src_ip = None,
        FilterKey::DstIp => next.dst_ip = None,
        FilterKey::SrcPort => next.src_port = None,
        FilterKey::DstPort => next.dst_port = None,
        FilterKey::Proto => next.proto = None,
        FilterKey::Flags => next.flags = None,
        FilterKey::Stream => next.stream = None,
        FilterKey::Pair => next.pair = false,
    }
    enforce_flag_invariant(next)
}
