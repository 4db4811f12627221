//! Algorithm identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Encryption algorithm applied to sensitive leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Algorithm {
    /// Equal plaintexts under one key give equal blobs, so encrypted fields
    /// stay usable in equality queries
    #[default]
    #[serde(rename = "AEAD_AES_256_GCM-Deterministic")]
    Deterministic,
    #[serde(rename = "AEAD_AES_256_GCM-Random")]
    Random,
}

impl Algorithm {
    pub fn id(&self) -> &'static str {
        match self {
            Algorithm::Deterministic => "AEAD_AES_256_GCM-Deterministic",
            Algorithm::Random => "AEAD_AES_256_GCM-Random",
        }
    }

    /// Tag byte written into blob headers
    pub(crate) fn tag(&self) -> u8 {
        match self {
            Algorithm::Deterministic => 1,
            Algorithm::Random => 2,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Algorithm::Deterministic),
            2 => Some(Algorithm::Random),
            _ => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AEAD_AES_256_GCM-Deterministic" => Ok(Algorithm::Deterministic),
            "AEAD_AES_256_GCM-Random" => Ok(Algorithm::Random),
            other => Err(format!("unknown algorithm '{}'", other)),
        }
    }
}
