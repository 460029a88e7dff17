use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeverityBand {
    Low,
    Med,
    High,
}

impl SeverityBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityBand::Low => "LOW",
            SeverityBand::Med => "MED",
            SeverityBand::High => "HIGH",
        }
    }
}

impl fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityBand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Ok(SeverityBand::High),
            "MED" | "MEDIUM" => Ok(SeverityBand::Med),
            "LOW" => Ok(SeverityBand::Low),
            _ => Err(()),
        }
    }
}

/// `>= 4` HIGH, `>= 2` MED, any other nonzero LOW, 0 or absent none.
pub fn severity_band(severity: Option<u32>) -> Option<SeverityBand> {
    match severity? {
        0 => None,
        s if s >= 4 => Some(SeverityBand::High),
        s if s >= 2 => Some(SeverityBand::Med),
        _ => Some(SeverityBand::Low),
    }
}

pub fn severity_label(severity: Option<u32>) -> &'static str {
    severity_band(severity).map_or("n/a", |band| band.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_boundaries() {
        assert_eq!(severity_band(None), None);
        assert_eq!(severity_band(Some(0)), None);
        assert_eq!(severity_band(Some(1)), Some(SeverityBand::Low));
        assert_eq!(severity_band(Some(2)), Some(SeverityBand::Med));
        assert_eq!(severity_band(Some(3)), Some(SeverityBand::Med));
        assert_eq!(severity_band(Some(4)), Some(SeverityBand::High));
        assert_eq!(severity_band(Some(9)), Some(SeverityBand::High));
    }

    #[test]
    fn labels() {
        assert_eq!(severity_label(Some(0)), "n/a");
        assert_eq!(severity_label(Some(1)), "LOW");
        assert_eq!(severity_label(Some(5)), "HIGH");
        assert_eq!("med".parse::<SeverityBand>(), Ok(SeverityBand::Med));
        assert!("urgent".parse::<SeverityBand>().is_err());
    }
}
