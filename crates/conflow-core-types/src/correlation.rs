//! Correlation types for request tracking and tracing
//!
//! A control-plane mutation crosses several await points (queue admission,
//! two snapshot reads, a directory create and a CAS write). These types let
//! every log event and error produced along the way be tied back to the
//! request that caused it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! correlation_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Fresh time-ordered id (UUIDv7)
            pub fn new() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            /// Adopt an id minted elsewhere, e.g. by the RPC layer
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

correlation_id!(
    /// Identifies one mutation request end to end
    RequestId
);

correlation_id!(
    /// Groups requests belonging to one client interaction
    TraceId
);

/// Correlation ids handed to engine commands
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub trace_id: Option<TraceId>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            trace_id: None,
        }
    }

    /// Context for an RPC call; a missing or blank id gets a fresh one.
    pub fn from_rpc(request_id: Option<&str>) -> Self {
        match request_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Self::with_request_id(RequestId::from(id)),
            None => Self::new(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}
