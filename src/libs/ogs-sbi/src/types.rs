//! SBI Types
//!
//! Service names, NF types, URI schemes and HTTP versions shared by the
//! SBI client and server.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SBI services consumed by the NEF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SbiServiceType {
    NnrfDisc,
    NpcfPolicyauthorization,
}

impl SbiServiceType {
    /// Service name as it appears in URIs and NF profiles
    pub fn to_name(&self) -> &'static str {
        match self {
            Self::NnrfDisc => "nnrf-disc",
            Self::NpcfPolicyauthorization => "npcf-policyauthorization",
        }
    }
}

impl fmt::Display for SbiServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_name())
    }
}

/// NF Type enumeration - matches OpenAPI_nf_type_e
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NfType {
    Nef,
    Pcf,
}

impl NfType {
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Nef => "NEF",
            Self::Pcf => "PCF",
        }
    }
}

impl fmt::Display for NfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

/// URI Scheme - matches OpenAPI_uri_scheme_e
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UriScheme {
    #[default]
    Http,
    Https,
}

impl UriScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

impl fmt::Display for UriScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UriScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(format!("unsupported URI scheme: {other}")),
        }
    }
}

/// HTTP version used on outbound SBI connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpVersion {
    Http1,
    #[default]
    Http2,
}

impl HttpVersion {
    /// Map the numeric form used in configuration files (1 or 2)
    pub fn from_config(version: u8) -> Option<Self> {
        match version {
            1 => Some(Self::Http1),
            2 => Some(Self::Http2),
            _ => None,
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http1 => f.write_str("HTTP/1.1"),
            Self::Http2 => f.write_str("HTTP/2"),
        }
    }
}
