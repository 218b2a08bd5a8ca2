//! Dotted-quad IPv4 validation.
//!
//! Deliberately looser than [`std::net::Ipv4Addr`]: octets with leading
//! zeros (`"010"`) are accepted and kept verbatim.

use std::fmt;
use std::str::FromStr;

use crate::error::TraceError;

/// Check that `s` is four dot-separated octets of 1-3 decimal digits, each
/// no greater than 255, with nothing before or after.
pub fn is_valid_ipv4(s: &str) -> bool {
    let mut octets = 0;
    for part in s.split('.') {
        octets += 1;
        if octets > 4 || !is_octet(part) {
            return false;
        }
    }
    octets == 4
}

fn is_octet(part: &str) -> bool {
    (1..=3).contains(&part.len())
        && part.bytes().all(|b| b.is_ascii_digit())
        && part.parse::<u16>().is_ok_and(|v| v <= 255)
}

/// An address that passed [`is_valid_ipv4`], stored exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Target(String);

impl Ipv4Target {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Ipv4Target {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_valid_ipv4(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(TraceError::InvalidFormat)
        }
    }
}

impl fmt::Display for Ipv4Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
