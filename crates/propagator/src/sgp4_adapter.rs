//! Pass search on top of the `sgp4` crate.
//!
//! The orbit model itself is SGP4/SDP4 from `sgp4`. This module only walks
//! the topocentric elevation curve: coarse steps until the horizon is
//! crossed, bisection for AOS and LOS, golden-section search for culmination.

use std::time::Duration;

use chrono::{DateTime, Utc};
use pass_core::{ObserverLocation, TwoLineElement};

use crate::geometry::{Station, gmst_radians, teme_to_ecef};
use crate::{PassCandidate, PropagationError, Propagator};

const DEFAULT_STEP: Duration = Duration::from_secs(30);
const DEFAULT_SEARCH_LIMIT: Duration = Duration::from_secs(10 * 86_400);
const ROOT_TOLERANCE_SECONDS: f64 = 0.01;
const INV_PHI: f64 = 0.618_033_988_749_894_9;

/// SGP4-backed [`Propagator`].
#[derive(Debug, Clone, Copy)]
pub struct Sgp4Propagator {
    step_seconds: f64,
    search_limit_seconds: f64,
}

impl Default for Sgp4Propagator {
    fn default() -> Self {
        Self {
            step_seconds: DEFAULT_STEP.as_secs_f64(),
            search_limit_seconds: DEFAULT_SEARCH_LIMIT.as_secs_f64(),
        }
    }
}

impl Sgp4Propagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coarse sampling interval. Passes shorter than this may be missed.
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step_seconds = step.as_secs_f64().max(ROOT_TOLERANCE_SECONDS);
        self
    }

    /// How far ahead a stream looks for the next rise (or set) before it
    /// concludes there is none and ends.
    pub fn with_search_limit(mut self, limit: Duration) -> Self {
        self.search_limit_seconds = limit.as_secs_f64();
        self
    }
}

impl Propagator for Sgp4Propagator {
    type Stream = Sgp4PassStream;

    fn passes(
        &self,
        tle: &TwoLineElement,
        observer: &ObserverLocation,
        start: DateTime<Utc>,
    ) -> Result<Self::Stream, PropagationError> {
        Ok(Sgp4PassStream {
            track: Sgp4Track::new(tle, observer)?,
            cursor: unix_seconds(start),
            step: self.step_seconds,
            limit: self.search_limit_seconds,
            finished: false,
        })
    }
}

/// Elevation of one satellite as seen from one station.
#[derive(Debug, Clone)]
pub struct Sgp4Track {
    constants: sgp4::Constants,
    epoch_unix: f64,
    station: Station,
}

impl Sgp4Track {
    pub fn new(tle: &TwoLineElement, observer: &ObserverLocation) -> Result<Self, PropagationError> {
        let elements =
            sgp4::Elements::from_tle(None, tle.line1().as_bytes(), tle.line2().as_bytes())
                .map_err(|err| PropagationError::InvalidElements(err.to_string()))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|err| PropagationError::InvalidElements(err.to_string()))?;
        let epoch_unix = elements.datetime.and_utc().timestamp_micros() as f64 / 1e6;
        Ok(Self {
            constants,
            epoch_unix,
            station: Station::new(observer),
        })
    }

    pub fn elevation_deg(&self, at: DateTime<Utc>) -> Result<f64, PropagationError> {
        self.elevation_at(unix_seconds(at))
    }

    fn elevation_at(&self, t: f64) -> Result<f64, PropagationError> {
        let minutes = (t - self.epoch_unix) / 60.0;
        let prediction = match self.constants.propagate(sgp4::MinutesSinceEpoch(minutes)) {
            Ok(prediction) => prediction,
            Err(err) => {
                return Err(PropagationError::Model {
                    at: to_datetime(t)?,
                    reason: err.to_string(),
                });
            }
        };
        let fixed = teme_to_ecef(&prediction.position, gmst_radians(t));
        Ok(self.station.elevation_deg(&fixed))
    }
}

/// Lazy pass sequence. Ends only when no rise or set is found within the
/// search limit; a model error is yielded once and then the stream is done.
#[derive(Debug)]
pub struct Sgp4PassStream {
    track: Sgp4Track,
    cursor: f64,
    step: f64,
    limit: f64,
    finished: bool,
}

impl Iterator for Sgp4PassStream {
    type Item = Result<PassCandidate, PropagationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_pass() {
            Ok(Some(candidate)) => Some(Ok(candidate)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl Sgp4PassStream {
    fn next_pass(&mut self) -> Result<Option<PassCandidate>, PropagationError> {
        let Some(aos) = self.find_rise()? else {
            return Ok(None);
        };
        let Some(los) = self.find_set(aos)? else {
            return Ok(None);
        };
        let (peak, max_elevation_deg) = self.find_peak(aos, los)?;
        self.cursor = los;

        let aos = to_datetime(aos)?;
        let los = to_datetime(los)?;
        let duration_seconds = (los - aos).num_microseconds().unwrap_or_default() as f64 / 1e6;
        Ok(Some(PassCandidate {
            aos,
            los,
            max_elevation_time: to_datetime(peak)?,
            max_elevation_deg,
            duration_seconds,
        }))
    }

    /// First instant above the horizon, walking back if already up.
    fn find_rise(&self) -> Result<Option<f64>, PropagationError> {
        let start = self.cursor;
        let mut t = start;
        if self.track.elevation_at(t)? > 0.0 {
            loop {
                let prev = t - self.step;
                if start - prev > self.limit {
                    return Ok(None);
                }
                if self.track.elevation_at(prev)? <= 0.0 {
                    let (_, above) = self.bisect_horizon(prev, t)?;
                    return Ok(Some(above));
                }
                t = prev;
            }
        }
        loop {
            let next = t + self.step;
            if next - start > self.limit {
                return Ok(None);
            }
            if self.track.elevation_at(next)? > 0.0 {
                let (_, above) = self.bisect_horizon(t, next)?;
                return Ok(Some(above));
            }
            t = next;
        }
    }

    /// First instant back at or below the horizon after `aos`.
    fn find_set(&self, aos: f64) -> Result<Option<f64>, PropagationError> {
        let mut t = aos;
        loop {
            let next = t + self.step;
            if next - aos > self.limit {
                return Ok(None);
            }
            if self.track.elevation_at(next)? <= 0.0 {
                let (below, _) = self.bisect_horizon(next, t)?;
                return Ok(Some(below));
            }
            t = next;
        }
    }

    /// Narrow a horizon crossing. `below` has elevation <= 0, `above` > 0;
    /// returns the final bracket in the same order.
    fn bisect_horizon(&self, mut below: f64, mut above: f64) -> Result<(f64, f64), PropagationError> {
        while (above - below).abs() > ROOT_TOLERANCE_SECONDS {
            let mid = 0.5 * (below + above);
            if self.track.elevation_at(mid)? > 0.0 {
                above = mid;
            } else {
                below = mid;
            }
        }
        Ok((below, above))
    }

    fn find_peak(&self, aos: f64, los: f64) -> Result<(f64, f64), PropagationError> {
        let (mut a, mut b) = (aos, los);
        let mut c = b - (b - a) * INV_PHI;
        let mut d = a + (b - a) * INV_PHI;
        let mut fc = self.track.elevation_at(c)?;
        let mut fd = self.track.elevation_at(d)?;
        while b - a > ROOT_TOLERANCE_SECONDS {
            if fc > fd {
                b = d;
                d = c;
                fd = fc;
                c = b - (b - a) * INV_PHI;
                fc = self.track.elevation_at(c)?;
            } else {
                a = c;
                c = d;
                fc = fd;
                d = a + (b - a) * INV_PHI;
                fd = self.track.elevation_at(d)?;
            }
        }
        let peak = 0.5 * (a + b);
        Ok((peak, self.track.elevation_at(peak)?))
    }
}

fn unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1e6
}

fn to_datetime(t: f64) -> Result<DateTime<Utc>, PropagationError> {
    DateTime::from_timestamp_micros((t * 1e6).round() as i64).ok_or(PropagationError::OutOfRange(t))
}
