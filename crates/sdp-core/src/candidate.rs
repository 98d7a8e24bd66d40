//! ICE Candidate Attribute Parser
//!
//! Parses candidate attributes as defined in RFC 8839.
//! Format: `candidate:<foundation> <component-id> <transport> <priority> <conn-addr> <port> typ <cand-type> [raddr <raddr>] [rport <rport>] *(extensions)`
//!
//! The reducer only needs the transport, the type and the connection address,
//! but the full line is parsed so malformed candidates are rejected instead of
//! being carried into a code.

use std::fmt;
use std::net::Ipv4Addr;

use crate::error::{Error, Result};

/// Candidate transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportType {
    Udp,
    Tcp,
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Udp => write!(f, "udp"),
            Self::Tcp => write!(f, "tcp"),
        }
    }
}

/// Candidate type (RFC 8445 Section 5.1.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateType {
    /// The device's own locally-configured address
    Host,
    /// Server reflexive (address seen by a STUN server)
    ServerReflexive,
    /// Peer reflexive (address learned during checks)
    PeerReflexive,
    /// Relayed through a TURN server
    Relay,
}

impl CandidateType {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "host" => Some(Self::Host),
            "srflx" => Some(Self::ServerReflexive),
            "prflx" => Some(Self::PeerReflexive),
            "relay" => Some(Self::Relay),
            _ => None,
        }
    }
}

impl fmt::Display for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::ServerReflexive => write!(f, "srflx"),
            Self::PeerReflexive => write!(f, "prflx"),
            Self::Relay => write!(f, "relay"),
        }
    }
}

/// A parsed candidate attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLine {
    pub foundation: String,
    pub component_id: u32,
    pub transport: TransportType,
    pub priority: u32,
    pub connection_address: String,
    pub port: u16,
    pub candidate_type: CandidateType,
    pub related_address: Option<String>,
    pub related_port: Option<u16>,
    pub extensions: Vec<(String, Option<String>)>,
}

impl CandidateLine {
    /// Connection address as an IPv4 literal, if it is one
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        self.connection_address.parse().ok()
    }

    /// Whether a peer on the same LAN can reach this candidate directly.
    ///
    /// UDP host candidates qualify when their address is private-range IPv4
    /// (10/8, 172.16/12, 192.168/16) or not an IPv4 literal at all, which
    /// covers resolver names such as `*.local` and IPv6 literals.
    pub fn is_lan_direct(&self) -> bool {
        if self.transport != TransportType::Udp || self.candidate_type != CandidateType::Host {
            return false;
        }
        match self.ipv4() {
            Some(addr) => addr.is_private(),
            None => true,
        }
    }
}

/// Parses a candidate attribute.
///
/// Accepts the bare value (`1 1 udp ...`), the attribute form
/// (`candidate:1 1 udp ...`) or the full line (`a=candidate:1 1 udp ...`).
pub fn parse_candidate(value: &str) -> Result<CandidateLine> {
    let value = value.trim();
    let value = value.strip_prefix("a=").unwrap_or(value);
    let value = value.strip_prefix("candidate:").unwrap_or(value);
    let parts: Vec<&str> = value.split_whitespace().collect();

    if parts.len() < 8 {
        return Err(Error::invalid_candidate(format!(
            "insufficient parts: {}",
            value
        )));
    }

    let foundation = parts[0].to_string();

    let component_id = match parts[1].parse::<u32>() {
        Ok(id) if (1..=256).contains(&id) => id,
        _ => {
            return Err(Error::invalid_candidate(format!(
                "invalid component ID: {}",
                parts[1]
            )))
        }
    };

    let transport = match parts[2].to_ascii_lowercase().as_str() {
        "udp" => TransportType::Udp,
        "tcp" => TransportType::Tcp,
        other => {
            return Err(Error::invalid_candidate(format!(
                "invalid transport: {}",
                other
            )))
        }
    };

    let priority = parts[3].parse::<u32>().map_err(|_| {
        Error::invalid_candidate(format!("invalid priority: {}", parts[3]))
    })?;

    let connection_address = parts[4].to_string();
    if connection_address.is_empty() {
        return Err(Error::invalid_candidate("empty connection address"));
    }

    let port = parts[5]
        .parse::<u16>()
        .map_err(|_| Error::invalid_candidate(format!("invalid port: {}", parts[5])))?;

    if parts[6] != "typ" {
        return Err(Error::invalid_candidate(format!(
            "expected 'typ' keyword, found: {}",
            parts[6]
        )));
    }

    let candidate_type = CandidateType::from_token(parts[7]).ok_or_else(|| {
        Error::invalid_candidate(format!("invalid candidate type: {}", parts[7]))
    })?;

    let mut idx = 8;
    let mut related_address = None;
    let mut related_port = None;
    let mut extensions = Vec::new();

    while idx < parts.len() {
        match parts[idx] {
            "raddr" => {
                idx += 1;
                let addr = parts
                    .get(idx)
                    .ok_or_else(|| Error::invalid_candidate("raddr keyword without address"))?;
                related_address = Some(addr.to_string());
            }
            "rport" => {
                idx += 1;
                let port = parts
                    .get(idx)
                    .ok_or_else(|| Error::invalid_candidate("rport keyword without port"))?;
                related_port = Some(port.parse::<u16>().map_err(|_| {
                    Error::invalid_candidate(format!("invalid related port: {}", port))
                })?);
            }
            key => {
                let mut value = None;
                if idx + 1 < parts.len() && !["raddr", "rport"].contains(&parts[idx + 1]) {
                    value = Some(parts[idx + 1].to_string());
                    idx += 1;
                }
                extensions.push((key.to_string(), value));
            }
        }
        idx += 1;
    }

    Ok(CandidateLine {
        foundation,
        component_id,
        transport,
        priority,
        connection_address,
        port,
        candidate_type,
        related_address,
        related_port,
        extensions,
    })
}
