use shared::Packet;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Index,
    Length,
    Stream,
}

impl FromStr for SortKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "index" => Ok(SortKey::Index),
            "length" | "len" => Ok(SortKey::Length),
            "stream" => Ok(SortKey::Stream),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Index => "index",
            SortKey::Length => "length",
            SortKey::Stream => "stream",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::Index,
            direction: SortDirection::Asc,
        }
    }
}

impl SortState {
    /// Same key flips the direction; a new key starts ascending.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.flipped(),
            }
        } else {
            Self {
                key,
                direction: SortDirection::Asc,
            }
        }
    }
}

fn compare(a: &Packet, b: &Packet, state: SortState) -> Ordering {
    match state.key {
        SortKey::Index => state.direction.apply(a.index.cmp(&b.index)),
        SortKey::Length => state.direction.apply(a.length.cmp(&b.length)),
        // packets without a stream go last in both directions
        SortKey::Stream => match (a.stream_id, b.stream_id) {
            (Some(x), Some(y)) => state.direction.apply(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

/// Stable ordering of a displayed page; the input is left untouched.
pub fn sort_packets(packets: &[Packet], state: SortState) -> Vec<&Packet> {
    let mut sorted: Vec<&Packet> = packets.iter().collect();
    sorted.sort_by(|a, b| compare(a, b, state));
    sorted
}
