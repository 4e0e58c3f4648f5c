mod common;

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, TimeZone, Utc};
use common::{entry, id, relabelled};
use pass_predictor::model::{ObserverLocation, Roster, TwoLineElement, VisibilityFilter};
use pass_predictor::predict::{
    CancelToken, HEADER, PredictionError, PredictionRequest, PredictionService, ScanError,
};
use pass_predictor::propagator::{PassCandidate, PropagationError, Propagator};
use pass_predictor::store::{StoreError, TleStore};

/// Replays canned passes per catalog number and records every stream start.
#[derive(Default)]
struct FakePropagator {
    passes: HashMap<String, Vec<PassCandidate>>,
    starts: RefCell<Vec<DateTime<Utc>>>,
}

struct FakeStream(std::vec::IntoIter<PassCandidate>);

impl Iterator for FakeStream {
    type Item = Result<PassCandidate, PropagationError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(Ok)
    }
}

impl Propagator for FakePropagator {
    type Stream = FakeStream;

    fn passes(
        &self,
        tle: &TwoLineElement,
        _observer: &ObserverLocation,
        start: DateTime<Utc>,
    ) -> Result<Self::Stream, PropagationError> {
        self.starts.borrow_mut().push(start);
        let upcoming: Vec<_> = self
            .passes
            .get(tle.catalog_number())
            .into_iter()
            .flatten()
            .filter(|pass| pass.los > start)
            .cloned()
            .collect();
        Ok(FakeStream(upcoming.into_iter()))
    }
}

fn utc(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("timestamp")
        .with_timezone(&Utc)
}

fn candidate(aos: &str, max_elevation_deg: f64) -> PassCandidate {
    let aos = utc(aos);
    PassCandidate {
        aos,
        los: aos + TimeDelta::minutes(12),
        max_elevation_time: aos + TimeDelta::minutes(6),
        max_elevation_deg,
        duration_seconds: 720.0,
    }
}

struct Fixture<Tz: TimeZone> {
    _dir: tempfile::TempDir,
    service: PredictionService<FakePropagator, Tz>,
}

fn fixture<Tz: TimeZone>(
    zone: Tz,
    passes: impl IntoIterator<Item = (&'static str, Vec<PassCandidate>)>,
) -> Fixture<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    let dir = tempfile::tempdir().expect("tempdir");
    let store = TleStore::new(dir.path());
    let mut propagator = FakePropagator::default();
    for (number, list) in passes {
        store.put(&id(number), &relabelled(number)).expect("seed TLE");
        propagator.passes.insert(number.to_string(), list);
    }
    let roster = Roster::from_entries([
        entry("11111", "Alpha"),
        entry("22222", "Bravo"),
        entry("33333", "Charlie"),
    ]);
    Fixture {
        _dir: dir,
        service: PredictionService::new(roster, store, propagator, zone),
    }
}

fn request(satellites: &[&str], start: (i32, u32, u32), horizon_days: u32) -> PredictionRequest {
    PredictionRequest {
        satellites: satellites.iter().map(|raw| id(raw)).collect(),
        start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).expect("date"),
        horizon_days,
        filter: VisibilityFilter::new(10.0, 0, 24).expect("filter"),
        observer: ObserverLocation::new(54.0078, -1.8560, 10.0).expect("observer"),
    }
}

fn earlier_day() -> DateTime<Utc> {
    utc("2022-01-01T12:00:00Z")
}

#[test]
fn rows_are_merged_by_aos_with_designator_tie_break() {
    let fx = fixture(
        Utc,
        [
            (
                "22222",
                vec![
                    candidate("2022-01-21T03:00:00Z", 40.0),
                    candidate("2022-01-21T10:00:00Z", 40.0),
                ],
            ),
            (
                "11111",
                vec![
                    candidate("2022-01-21T10:00:00Z", 30.0),
                    candidate("2022-01-21T12:30:00Z", 30.0),
                ],
            ),
        ],
    );
    let result = fx
        .service
        .predict_at(
            &request(&["22222", "11111"], (2022, 1, 21), 1),
            earlier_day(),
            &CancelToken::new(),
        )
        .expect("prediction");

    assert_eq!(result.header, HEADER);
    let order: Vec<(&str, &str)> = result
        .rows
        .iter()
        .map(|row| (row.name.as_str(), row.start_time.as_str()))
        .collect();
    assert_eq!(
        order,
        [
            ("Bravo", "03:00:00"),
            ("Alpha", "10:00:00"),
            ("Bravo", "10:00:00"),
            ("Alpha", "12:30:00"),
        ]
    );
    assert!(result.rows.windows(2).all(|pair| pair[0].aos <= pair[1].aos));
}

#[test]
fn window_end_midnight_is_exclusive() {
    let fx = fixture(
        Utc,
        [(
            "11111",
            vec![
                candidate("2022-01-21T23:59:59Z", 45.0),
                candidate("2022-01-22T00:00:00Z", 45.0),
            ],
        )],
    );
    let result = fx
        .service
        .predict_at(
            &request(&["11111"], (2022, 1, 21), 1),
            earlier_day(),
            &CancelToken::new(),
        )
        .expect("prediction");
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].start_time, "23:59:59");
}

#[test]
fn low_and_out_of_hours_passes_are_dropped() {
    let plus_two = FixedOffset::east_opt(2 * 3_600).expect("offset");
    let fx = fixture(
        plus_two,
        [(
            "11111",
            vec![
                candidate("2022-01-21T05:00:00Z", 9.9),
                candidate("2022-01-21T06:00:00Z", 10.0),
                candidate("2022-01-21T15:00:00Z", 60.0),
            ],
        )],
    );
    let mut req = request(&["11111"], (2022, 1, 21), 1);
    req.filter = VisibilityFilter::new(10.0, 6, 12).expect("filter");
    let result = fx
        .service
        .predict_at(&req, earlier_day(), &CancelToken::new())
        .expect("prediction");
    // 06:06 UTC culminates at 08:06 local; 15:06 UTC at 17:06 local
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].start_time, "08:00:00");
    assert_eq!(result.rows[0].max_elevation, "10.0");
}

#[test]
fn identical_requests_give_identical_tables() {
    let fx = fixture(
        Utc,
        [(
            "11111",
            vec![
                candidate("2022-01-21T01:00:00Z", 20.0),
                candidate("2022-01-22T01:00:00Z", 70.0),
            ],
        )],
    );
    let req = request(&["11111"], (2022, 1, 21), 3);
    let first = fx
        .service
        .predict_at(&req, earlier_day(), &CancelToken::new())
        .expect("first");
    let second = fx
        .service
        .predict_at(&req, earlier_day(), &CancelToken::new())
        .expect("second");
    assert_eq!(first, second);
}

#[test]
fn today_starts_at_the_current_instant() {
    let fx = fixture(Utc, [("11111", vec![candidate("2022-01-21T18:00:00Z", 30.0)])]);
    let now = utc("2022-01-21T15:42:10Z");
    fx.service
        .predict_at(&request(&["11111"], (2022, 1, 21), 1), now, &CancelToken::new())
        .expect("prediction");
    fx.service
        .predict_at(&request(&["11111"], (2022, 1, 23), 1), now, &CancelToken::new())
        .expect("prediction");
    assert_eq!(fx_starts(&fx), [now, utc("2022-01-23T00:00:00Z")]);
}

fn fx_starts<Tz: TimeZone>(fx: &Fixture<Tz>) -> Vec<DateTime<Utc>>
where
    Tz::Offset: std::fmt::Display,
{
    fx.service.propagator().starts.borrow().clone()
}

#[test]
fn repeated_designators_are_scanned_once() {
    let fx = fixture(Utc, [("11111", vec![candidate("2022-01-21T01:00:00Z", 20.0)])]);
    let result = fx
        .service
        .predict_at(
            &request(&["11111", "11111"], (2022, 1, 21), 1),
            earlier_day(),
            &CancelToken::new(),
        )
        .expect("prediction");
    assert_eq!(result.rows.len(), 1);
    assert_eq!(fx_starts(&fx).len(), 1);
}

#[test]
fn unknown_designator_is_rejected_before_scanning() {
    let fx = fixture(Utc, [("11111", vec![])]);
    let err = fx
        .service
        .predict_at(
            &request(&["11111", "99999"], (2022, 1, 21), 1),
            earlier_day(),
            &CancelToken::new(),
        )
        .expect_err("unknown satellite");
    assert!(matches!(err, PredictionError::UnknownSatellite(ref sat) if sat.as_str() == "99999"));
    assert!(fx_starts(&fx).is_empty());
}

#[test]
fn missing_tle_fails_the_whole_request() {
    // 33333 is on the roster but has no stored record
    let fx = fixture(Utc, [("11111", vec![candidate("2022-01-21T01:00:00Z", 20.0)])]);
    let err = fx
        .service
        .predict_at(
            &request(&["11111", "33333"], (2022, 1, 21), 1),
            earlier_day(),
            &CancelToken::new(),
        )
        .expect_err("missing TLE");
    match err {
        PredictionError::PredictionFailed { id, cause } => {
            assert_eq!(id.as_str(), "33333");
            assert!(matches!(cause, ScanError::Tle(StoreError::MissingTle { .. })));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn corrupt_tle_fails_the_whole_request() {
    let fx = fixture(Utc, [("11111", vec![candidate("2022-01-21T01:00:00Z", 20.0)])]);
    let path = fx.service.store().record_path(&id("11111"));
    std::fs::write(&path, "1 11111U truncated\n").expect("corrupt record");
    let err = fx
        .service
        .predict_at(
            &request(&["11111"], (2022, 1, 21), 1),
            earlier_day(),
            &CancelToken::new(),
        )
        .expect_err("corrupt TLE");
    assert!(matches!(
        err,
        PredictionError::PredictionFailed {
            cause: ScanError::Tle(StoreError::CorruptTle { .. }),
            ..
        }
    ));
}

#[test]
fn cancelled_request_returns_no_table() {
    let fx = fixture(Utc, [("11111", vec![candidate("2022-01-21T01:00:00Z", 20.0)])]);
    let cancel = CancelToken::new();
    cancel.cancel();
    let err = fx
        .service
        .predict_at(&request(&["11111"], (2022, 1, 21), 1), earlier_day(), &cancel)
        .expect_err("cancelled");
    assert!(matches!(err, PredictionError::Cancelled));
}

#[test]
fn invalid_request_is_rejected() {
    let fx = fixture(Utc, [("11111", vec![])]);
    let err = fx
        .service
        .predict_at(
            &request(&["11111"], (2022, 1, 21), 0),
            earlier_day(),
            &CancelToken::new(),
        )
        .expect_err("zero horizon");
    assert!(matches!(err, PredictionError::InvalidInput(ref input) if input.field == "horizon"));
}
