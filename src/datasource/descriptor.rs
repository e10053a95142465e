//! Connection descriptor parsing.
//!
//! Data-source targets are described as `<host>:<port>/<database>`. The
//! format check is independent of connectivity: a malformed descriptor is
//! rejected here and no connection attempt is ever made for it.

use std::sync::LazyLock;

use regex::Regex;

static DESCRIPTOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]+):(\d+)/(.+)$").unwrap());

/// A parsed `<host>:<port>/<database>` target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl ConnectionDescriptor {
    /// Parse a descriptor, returning `None` on any format violation
    /// (missing port, non-numeric port, port out of range, missing
    /// database).
    pub fn parse(descriptor: &str) -> Option<Self> {
        let captures = DESCRIPTOR_REGEX.captures(descriptor)?;
        let port = captures[2].parse::<u16>().ok()?;
        Some(Self {
            host: captures[1].to_string(),
            port,
            database: captures[3].to_string(),
        })
    }
}
