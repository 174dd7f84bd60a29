use serde::{Deserialize, Serialize};

use crate::errors::ConfigValidationError;

/// Spec §6 `tls`. Certificate/key material is taken as paths rather than
/// loaded bytes so the config stays `Serialize`/`Deserialize`; the client
/// reads and parses them when a TLS connection is first established.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub min_version: TlsVersion,
    pub max_version: Option<TlsVersion>,
    pub verification: TlsVerification,
    pub trust_roots_path: Option<String>,
    pub client_cert_chain_path: Option<String>,
    pub client_private_key_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TlsVersion {
    #[serde(rename = "1.2")]
    V1_2,
    #[serde(rename = "1.3")]
    V1_3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TlsVerification {
    Full,
    NoHostname,
    None,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_version: TlsVersion::V1_2,
            max_version: None,
            verification: TlsVerification::Full,
            trust_roots_path: None,
            client_cert_chain_path: None,
            client_private_key_path: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.client_cert_chain_path.is_some() != self.client_private_key_path.is_some() {
            return Err(ConfigValidationError::config(
                "client_cert_chain_path and client_private_key_path must be set together",
            ));
        }
        if let (Some(min), Some(max)) = (Some(self.min_version), self.max_version) {
            if max < min {
                return Err(ConfigValidationError::config(
                    "tls max_version cannot be lower than min_version",
                ));
            }
        }
        Ok(())
    }
}

impl PartialOrd for TlsVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TlsVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn rank(v: &TlsVersion) -> u8 {
            match v {
                TlsVersion::V1_2 => 0,
                TlsVersion::V1_3 => 1,
            }
        }
        rank(self).cmp(&rank(other))
    }
}
