//! Record-level errors. Any of these marks the outing being processed as
//! failed; none of them stops the run.

use thiserror::Error;

use crate::fetch::FetchError;
use crate::transport::TransportType;

#[derive(Debug, Error)]
pub enum CarbonError {
    #[error("unknown transport type '{0}'")]
    UnknownTransportType(String),

    #[error("transport type {0} cannot be resolved reliably by the distance provider")]
    UnsupportedForProvider(TransportType),

    #[error("no emissions equivalent for transport type {0}")]
    NoEmissionsEquivalent(TransportType),

    #[error("invalid round-trip marker '{0}' (expected AR or AS)")]
    InvalidRoundTripMarker(String),

    #[error("invalid coordinate '{0}'")]
    InvalidCoordinate(String),

    #[error("distance unavailable from every provider mode")]
    DistanceUnavailable {
        #[source]
        source: FetchError,
    },

    #[error("emissions unavailable")]
    EmissionsUnavailable {
        #[source]
        source: FetchError,
    },
}

impl CarbonError {
    /// The message followed by its chain of causes, `": "`-separated.
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_walks_the_cause_chain() {
        let err = CarbonError::EmissionsUnavailable {
            source: FetchError::RequestFailed {
                attempts: 3,
                source: Box::new(FetchError::Status {
                    status: 500,
                    body: "oops".into(),
                }),
            },
        };

        assert_eq!(
            err.detail(),
            "emissions unavailable: request failed after 3 attempts: provider returned status 500: oops"
        );
    }

    #[test]
    fn test_detail_without_source() {
        let err = CarbonError::InvalidRoundTripMarker("XX".into());
        assert_eq!(err.detail(), "invalid round-trip marker 'XX' (expected AR or AS)");
    }
}
