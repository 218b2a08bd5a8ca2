use thiserror::Error;

/// Context prefix for transport failures while resolving the caller's IP.
pub const PUBLIC_IP_CONTEXT: &str = "Failed to fetch your public IP";

/// Context prefix for transport failures during a geolocation lookup.
pub const LOOKUP_CONTEXT: &str = "Request failed";

/// Everything that can go wrong during a single trace.
///
/// The `Display` text of each variant is exactly the line shown to the user,
/// so the loop never needs to know more than the variant it got.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    /// The typed target is not a dotted-quad IPv4 address.
    #[error("Invalid IP address format. Please try again.")]
    InvalidFormat,

    /// The remote host could not be reached at all.
    #[error("No internet connection. Please check your network.")]
    NoNetwork,

    /// Timeout, non-2xx status, malformed body, or any other transport fault.
    #[error("{context}: {reason}")]
    Transport {
        context: &'static str,
        reason: String,
    },

    /// The geolocation service answered but declared the query invalid.
    #[error("API error: {0}")]
    ApiRejected(String),
}

impl TraceError {
    /// Classify a reqwest failure: connection-level faults become
    /// [`TraceError::NoNetwork`], the rest keep their diagnostic text.
    pub fn from_reqwest(context: &'static str, err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::NoNetwork
        } else {
            Self::Transport {
                context,
                reason: err.to_string(),
            }
        }
    }

    pub fn transport(context: &'static str, reason: impl Into<String>) -> Self {
        Self::Transport {
            context,
            reason: reason.into(),
        }
    }
}
