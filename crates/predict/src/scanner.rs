//! Bounded consumption of a propagator's pass stream.

use pass_core::{ObserverLocation, Pass, PredictionWindow, SatelliteId};
use pass_propagator::{PassCandidate, PropagationError, Propagator};
use pass_store::{StoreError, TleStore};
use thiserror::Error;
use tracing::debug;

use crate::cancel::CancelToken;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Tle(#[from] StoreError),
    #[error(transparent)]
    Propagation(#[from] PropagationError),
    #[error("scan cancelled")]
    Cancelled,
}

/// Scans one satellite at a time over a window.
pub struct PassScanner<'a, P> {
    store: &'a TleStore,
    propagator: &'a P,
    cancel: &'a CancelToken,
}

impl<'a, P: Propagator> PassScanner<'a, P> {
    pub fn new(store: &'a TleStore, propagator: &'a P, cancel: &'a CancelToken) -> Self {
        Self {
            store,
            propagator,
            cancel,
        }
    }

    /// Raw, unfiltered passes of `id` with AOS before the window end.
    pub fn scan(
        &self,
        id: &SatelliteId,
        observer: &ObserverLocation,
        window: &PredictionWindow,
    ) -> Result<Vec<Pass>, ScanError> {
        let tle = self.store.get(id)?;
        let stream = self.propagator.passes(&tle, observer, window.start)?;
        let passes = collect_window(id, stream, window, self.cancel)?;
        debug!(designator = %id, passes = passes.len(), "scan complete");
        Ok(passes)
    }
}

/// Pull candidates until one reaches the window end.
///
/// The stream is taken by value and dropped before this returns, whichever
/// way it returns: window exit, stream end, propagation error, or
/// cancellation (checked before every pull).
pub fn collect_window<S>(
    id: &SatelliteId,
    mut stream: S,
    window: &PredictionWindow,
    cancel: &CancelToken,
) -> Result<Vec<Pass>, ScanError>
where
    S: Iterator<Item = Result<PassCandidate, PropagationError>>,
{
    let mut passes = Vec::new();
    loop {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        let Some(candidate) = stream.next() else {
            break;
        };
        let candidate = candidate?;
        if !window.contains_aos(candidate.aos) {
            break;
        }
        passes.push(Pass {
            satellite_id: id.clone(),
            aos: candidate.aos,
            los: candidate.los,
            max_elevation_time: candidate.max_elevation_time,
            max_elevation_deg: candidate.max_elevation_deg,
            duration_seconds: candidate.duration_seconds,
        });
    }
    Ok(passes)
}
