#![allow(dead_code)]

use pass_predictor::model::{SatelliteCatalogEntry, SatelliteId, TwoLineElement};

pub const NOAA_19_LINE1: &str =
    "1 33591U 09005A   22020.44937208  .00000081  00000-0  68837-4 0  9993";
pub const NOAA_19_LINE2: &str =
    "2 33591  99.1663  51.3451 0013122 241.8520 118.1325 14.12523655667551";

pub fn noaa_19() -> TwoLineElement {
    TwoLineElement::new(NOAA_19_LINE1, NOAA_19_LINE2).expect("fixture TLE")
}

/// The fixture pair relabelled with another five-digit catalog number.
pub fn relabelled(catalog_number: &str) -> TwoLineElement {
    TwoLineElement::new(
        NOAA_19_LINE1.replace("33591", catalog_number),
        NOAA_19_LINE2.replace("33591", catalog_number),
    )
    .expect("relabelled TLE")
}

pub fn id(raw: &str) -> SatelliteId {
    SatelliteId::new(raw).expect("designator")
}

pub fn entry(raw: &str, name: &str) -> SatelliteCatalogEntry {
    SatelliteCatalogEntry {
        id: id(raw),
        name: name.to_string(),
    }
}
