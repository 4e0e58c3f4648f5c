//! Request orchestration: validate, resolve the window, scan every
//! satellite, filter, then aggregate.

use std::collections::BTreeSet;
use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use pass_core::Roster;
use pass_propagator::Propagator;
use pass_store::TleStore;
use tracing::{debug, info};

use crate::aggregate::{PredictionResult, aggregate};
use crate::cancel::CancelToken;
use crate::filter::retain_visible;
use crate::request::PredictionRequest;
use crate::scanner::{PassScanner, ScanError};
use crate::window::{prediction_window, resolve_start};
use crate::PredictionError;

/// Answers prediction requests for one roster, store and observer zone.
pub struct PredictionService<P, Tz> {
    roster: Roster,
    store: TleStore,
    propagator: P,
    zone: Tz,
}

impl<P, Tz> PredictionService<P, Tz>
where
    P: Propagator,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(roster: Roster, store: TleStore, propagator: P, zone: Tz) -> Self {
        Self {
            roster,
            store,
            propagator,
            zone,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn store(&self) -> &TleStore {
        &self.store
    }

    pub fn propagator(&self) -> &P {
        &self.propagator
    }

    pub fn zone(&self) -> &Tz {
        &self.zone
    }

    pub fn predict(
        &self,
        request: &PredictionRequest,
        cancel: &CancelToken,
    ) -> Result<PredictionResult, PredictionError> {
        self.predict_at(request, Utc::now(), cancel)
    }

    /// Same as [`predict`](Self::predict) with `now` as the clock reading.
    pub fn predict_at(
        &self,
        request: &PredictionRequest,
        now: DateTime<Utc>,
        cancel: &CancelToken,
    ) -> Result<PredictionResult, PredictionError> {
        request.validate()?;
        if let Some(unknown) = request
            .satellites
            .iter()
            .find(|id| !self.roster.contains(id))
        {
            return Err(PredictionError::UnknownSatellite(unknown.clone()));
        }

        let start = resolve_start(request.start_date, now, &self.zone)?;
        let window = prediction_window(start, request.horizon_days, &self.zone)?;
        info!(
            satellites = request.satellites.len(),
            start = %window.start,
            end = %window.end,
            "predicting passes"
        );

        let scanner = PassScanner::new(&self.store, &self.propagator, cancel);
        let mut seen = BTreeSet::new();
        let mut passes = Vec::new();
        for id in &request.satellites {
            if !seen.insert(id) {
                continue;
            }
            let raw = scanner
                .scan(id, &request.observer, &window)
                .map_err(|cause| match cause {
                    ScanError::Cancelled => PredictionError::Cancelled,
                    cause => PredictionError::PredictionFailed {
                        id: id.clone(),
                        cause,
                    },
                })?;
            let visible = retain_visible(raw, &request.filter, &self.zone);
            debug!(designator = %id, visible = visible.len(), "filtered");
            passes.extend(visible);
        }

        let result = aggregate(passes, &self.roster, &self.zone);
        info!(rows = result.rows.len(), "prediction complete");
        Ok(result)
    }
}
