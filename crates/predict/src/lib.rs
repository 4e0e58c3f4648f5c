//! Pass prediction pipeline: scan, filter, merge, format.

pub mod aggregate;
pub mod cancel;
pub mod filter;
pub mod request;
pub mod scanner;
pub mod service;
pub mod window;

pub use aggregate::{HEADER, PassRow, PredictionResult};
pub use cancel::CancelToken;
pub use request::{PredictionRequest, RequestForm};
pub use scanner::{PassScanner, ScanError};
pub use service::PredictionService;

use pass_core::{InvalidInput, SatelliteId};
use thiserror::Error;

/// Errors that abort a prediction request. No partial table is returned.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error("satellite `{0}` is not in the roster")]
    UnknownSatellite(SatelliteId),
    #[error("prediction failed for `{id}`: {cause}")]
    PredictionFailed {
        id: SatelliteId,
        #[source]
        cause: ScanError,
    },
    #[error("prediction cancelled")]
    Cancelled,
}
