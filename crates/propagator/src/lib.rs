//! Orbit propagator adapter.
//!
//! A [`Propagator`] turns an element set, an observer and a start instant
//! into a lazy stream of pass candidates in ascending AOS order. The stream
//! has no natural end: callers must bound consumption themselves and drop
//! the stream when done. Opening a new stream with the same inputs yields the
//! same candidates.

pub mod geometry;
mod sgp4_adapter;

pub use sgp4_adapter::{Sgp4PassStream, Sgp4Propagator, Sgp4Track};

use chrono::{DateTime, Utc};
use pass_core::{ObserverLocation, TwoLineElement};
use thiserror::Error;

/// One pass as reported by the propagator, before tagging or filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct PassCandidate {
    pub aos: DateTime<Utc>,
    pub los: DateTime<Utc>,
    pub max_elevation_time: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagationError {
    #[error("element set rejected by the orbit model: {0}")]
    InvalidElements(String),
    #[error("orbit model failed at {at}: {reason}")]
    Model { at: DateTime<Utc>, reason: String },
    #[error("instant {0} seconds after the Unix epoch is out of range")]
    OutOfRange(f64),
}

/// Source of pass candidates for one satellite and observer.
pub trait Propagator {
    type Stream: Iterator<Item = Result<PassCandidate, PropagationError>>;

    /// Open a stream of passes whose AOS is at or after `start`, plus the
    /// pass in progress at `start`, if any.
    fn passes(
        &self,
        tle: &TwoLineElement,
        observer: &ObserverLocation,
        start: DateTime<Utc>,
    ) -> Result<Self::Stream, PropagationError>;
}
