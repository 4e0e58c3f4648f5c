//! Visibility predicate over culmination elevation and local hour.

use chrono::{TimeZone, Timelike};
use pass_core::{Pass, VisibilityFilter};

/// `true` iff the pass culminates high enough, at an observer-local hour
/// inside `[min_hour, max_hour]`.
pub fn is_visible<Tz: TimeZone>(filter: &VisibilityFilter, pass: &Pass, zone: &Tz) -> bool {
    if pass.max_elevation_deg.is_nan() || pass.max_elevation_deg < filter.min_elevation_deg {
        return false;
    }
    let hour = pass.max_elevation_time.with_timezone(zone).hour();
    (filter.min_hour..=filter.max_hour).contains(&hour)
}

pub fn retain_visible<Tz: TimeZone>(
    mut passes: Vec<Pass>,
    filter: &VisibilityFilter,
    zone: &Tz,
) -> Vec<Pass> {
    passes.retain(|pass| is_visible(filter, pass, zone));
    passes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, Utc};
    use pass_core::SatelliteId;

    fn pass(max_time: &str, max_el: f64) -> Pass {
        let t = DateTime::parse_from_rfc3339(max_time).unwrap().with_timezone(&Utc);
        Pass {
            satellite_id: SatelliteId::new("33591").unwrap(),
            aos: t,
            los: t,
            max_elevation_time: t,
            max_elevation_deg: max_el,
            duration_seconds: 0.0,
        }
    }

    #[test]
    fn elevation_threshold_is_inclusive() {
        let filter = VisibilityFilter::new(10.0, 0, 24).unwrap();
        assert!(is_visible(&filter, &pass("2022-01-21T12:00:00Z", 10.0), &Utc));
        assert!(!is_visible(&filter, &pass("2022-01-21T12:00:00Z", 9.99), &Utc));
        assert!(!is_visible(&filter, &pass("2022-01-21T12:00:00Z", f64::NAN), &Utc));
    }

    #[test]
    fn hour_bounds_are_inclusive() {
        let filter = VisibilityFilter::new(0.0, 18, 21).unwrap();
        assert!(is_visible(&filter, &pass("2022-01-21T18:00:00Z", 45.0), &Utc));
        assert!(is_visible(&filter, &pass("2022-01-21T21:59:59Z", 45.0), &Utc));
        assert!(!is_visible(&filter, &pass("2022-01-21T17:59:59Z", 45.0), &Utc));
        assert!(!is_visible(&filter, &pass("2022-01-21T22:00:00Z", 45.0), &Utc));
    }

    #[test]
    fn hour_is_taken_in_the_observer_zone() {
        let filter = VisibilityFilter::new(0.0, 20, 23).unwrap();
        let plus_three = FixedOffset::east_opt(3 * 3_600).unwrap();
        // 18:30 UTC is 21:30 at UTC+3
        let p = pass("2022-01-21T18:30:00Z", 45.0);
        assert!(is_visible(&filter, &p, &plus_three));
        assert!(!is_visible(&filter, &p, &Utc));
    }

    #[test]
    fn retain_drops_only_failing_passes() {
        let filter = VisibilityFilter::new(30.0, 0, 24).unwrap();
        let kept = retain_visible(
            vec![
                pass("2022-01-21T01:00:00Z", 12.0),
                pass("2022-01-21T02:00:00Z", 55.0),
            ],
            &filter,
            &Utc,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].max_elevation_deg, 55.0);
    }
}
