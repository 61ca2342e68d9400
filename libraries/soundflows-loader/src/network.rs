//! Network quality classification

use serde::{Deserialize, Serialize};
use soundflows_core::NetworkInfo;
use std::fmt;

/// Effective connection class reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NetworkSpeed {
    #[serde(rename = "slow-2g")]
    Slow2g,
    #[serde(rename = "2g")]
    TwoG,
    #[serde(rename = "3g")]
    ThreeG,
    #[serde(rename = "4g")]
    FourG,
    /// No signal, or a value we do not recognise
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl NetworkSpeed {
    /// Read the current class from a network information source
    pub fn classify(network: &dyn NetworkInfo) -> Self {
        network
            .connection()
            .map_or(Self::Unknown, |info| Self::from_effective_type(&info.effective_type))
    }

    pub fn from_effective_type(effective_type: &str) -> Self {
        match effective_type {
            "slow-2g" => Self::Slow2g,
            "2g" => Self::TwoG,
            "3g" => Self::ThreeG,
            "4g" => Self::FourG,
            _ => Self::Unknown,
        }
    }

    /// Number of tracks to prefetch per category on this connection
    pub fn prefetch_count(self) -> usize {
        match self {
            Self::Slow2g => 1,
            Self::TwoG => 2,
            Self::ThreeG => 4,
            Self::FourG => 8,
            Self::Unknown => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow2g => "slow-2g",
            Self::TwoG => "2g",
            Self::ThreeG => "3g",
            Self::FourG => "4g",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NetworkSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soundflows_core::test_utils::StaticNetwork;
    use soundflows_core::NoNetworkInfo;

    #[test]
    fn prefetch_table() {
        assert_eq!(NetworkSpeed::Slow2g.prefetch_count(), 1);
        assert_eq!(NetworkSpeed::TwoG.prefetch_count(), 2);
        assert_eq!(NetworkSpeed::ThreeG.prefetch_count(), 4);
        assert_eq!(NetworkSpeed::FourG.prefetch_count(), 8);
        assert_eq!(NetworkSpeed::Unknown.prefetch_count(), 3);
    }

    #[test]
    fn missing_signal_is_unknown() {
        assert_eq!(NetworkSpeed::classify(&NoNetworkInfo), NetworkSpeed::Unknown);
        assert_eq!(
            NetworkSpeed::classify(&StaticNetwork::absent()),
            NetworkSpeed::Unknown
        );
    }

    #[test]
    fn unrecognised_type_is_unknown() {
        assert_eq!(NetworkSpeed::from_effective_type("5g"), NetworkSpeed::Unknown);
        assert_eq!(NetworkSpeed::from_effective_type(""), NetworkSpeed::Unknown);
    }

    #[test]
    fn classify_follows_signal() {
        let network = StaticNetwork::new("slow-2g");
        assert_eq!(NetworkSpeed::classify(&network), NetworkSpeed::Slow2g);

        network.set("4g");
        assert_eq!(NetworkSpeed::classify(&network), NetworkSpeed::FourG);
    }

    #[test]
    fn serializes_as_effective_type() {
        assert_eq!(
            serde_json::to_string(&NetworkSpeed::Slow2g).unwrap(),
            "\"slow-2g\""
        );
        assert_eq!(NetworkSpeed::ThreeG.to_string(), "3g");
    }
}
