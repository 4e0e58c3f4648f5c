//! Earth-fixed geometry for topocentric elevation.
//!
//! Times are Unix seconds as `f64`; distances are kilometres.

use pass_core::ObserverLocation;

/// WGS-84 equatorial radius (km).
const WGS84_A_KM: f64 = 6_378.137;
/// WGS-84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// Julian date of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
/// Julian date of J2000.0.
const J2000_JD: f64 = 2_451_545.0;

pub type Vector3 = [f64; 3];

/// Greenwich mean sidereal angle in radians (IAU-82), treating UTC as UT1.
pub fn gmst_radians(unix_seconds: f64) -> f64 {
    let jd = unix_seconds / 86_400.0 + UNIX_EPOCH_JD;
    let t = (jd - J2000_JD) / 36_525.0;
    let seconds = 67_310.548_41 + (876_600.0 * 3_600.0 + 8_640_184.812_866) * t
        + 0.093_104 * t * t
        - 6.2e-6 * t * t * t;
    // 240 sidereal seconds per degree
    (seconds.rem_euclid(86_400.0) / 240.0).to_radians()
}

/// Observer position and local vertical in the Earth-fixed frame.
#[derive(Debug, Clone, Copy)]
pub struct Station {
    pub position_km: Vector3,
    pub up: Vector3,
}

impl Station {
    pub fn new(observer: &ObserverLocation) -> Self {
        let lat = observer.latitude.to_radians();
        let lon = observer.longitude.to_radians();
        let h = observer.altitude_m / 1_000.0;
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let n = WGS84_A_KM / (1.0 - e2 * lat.sin().powi(2)).sqrt();
        let position_km = [
            (n + h) * lat.cos() * lon.cos(),
            (n + h) * lat.cos() * lon.sin(),
            (n * (1.0 - e2) + h) * lat.sin(),
        ];
        let up = [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()];
        Self { position_km, up }
    }

    /// Elevation in degrees of an Earth-fixed point above the local horizon.
    pub fn elevation_deg(&self, target_km: &Vector3) -> f64 {
        let range = [
            target_km[0] - self.position_km[0],
            target_km[1] - self.position_km[1],
            target_km[2] - self.position_km[2],
        ];
        let norm = dot(&range, &range).sqrt();
        if norm == 0.0 {
            return 90.0;
        }
        (dot(&range, &self.up) / norm).clamp(-1.0, 1.0).asin().to_degrees()
    }
}

/// Rotate a TEME (inertial) position into the Earth-fixed frame.
pub fn teme_to_ecef(position_km: &Vector3, gmst: f64) -> Vector3 {
    let (sin, cos) = gmst.sin_cos();
    [
        position_km[0] * cos + position_km[1] * sin,
        -position_km[0] * sin + position_km[1] * cos,
        position_km[2],
    ]
}

fn dot(a: &Vector3, b: &Vector3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
