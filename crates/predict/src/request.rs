use chrono::NaiveDate;
use pass_core::constants::MAX_HORIZON_DAYS;
use pass_core::{InvalidInput, ObserverLocation, SatelliteId, VisibilityFilter};
use serde::{Deserialize, Serialize};

/// One immutable prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub satellites: Vec<SatelliteId>,
    pub start_date: NaiveDate,
    pub horizon_days: u32,
    pub filter: VisibilityFilter,
    pub observer: ObserverLocation,
}

impl PredictionRequest {
    pub fn validate(&self) -> Result<(), InvalidInput> {
        if self.satellites.is_empty() {
            return Err(InvalidInput::new("satellites", "at least one is required"));
        }
        if !(1..=MAX_HORIZON_DAYS).contains(&self.horizon_days) {
            return Err(InvalidInput::new(
                "horizon",
                format!(
                    "{} days is outside 1..={MAX_HORIZON_DAYS}",
                    self.horizon_days
                ),
            ));
        }
        self.filter.validate()?;
        self.observer.validate()
    }
}

/// Raw text fields, as a form or command line collects them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestForm {
    /// Designators separated by commas or whitespace.
    pub satellites: String,
    pub start_date: String,
    pub horizon_days: String,
    pub min_elevation_deg: String,
    pub min_hour: String,
    pub max_hour: String,
    pub latitude: String,
    pub longitude: String,
    pub altitude_m: String,
}

impl TryFrom<&RequestForm> for PredictionRequest {
    type Error = InvalidInput;

    fn try_from(form: &RequestForm) -> Result<Self, Self::Error> {
        let satellites = form
            .satellites
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(SatelliteId::new)
            .collect::<Result<Vec<_>, _>>()?;
        let filter = VisibilityFilter::new(
            parse_field("minimum elevation", &form.min_elevation_deg)?,
            parse_field("minimum hour", &form.min_hour)?,
            parse_field("maximum hour", &form.max_hour)?,
        )?;
        let observer = ObserverLocation::new(
            parse_field("latitude", &form.latitude)?,
            parse_field("longitude", &form.longitude)?,
            parse_field("altitude", &form.altitude_m)?,
        )?;
        let request = PredictionRequest {
            satellites,
            start_date: parse_start_date(&form.start_date)?,
            horizon_days: parse_field("horizon", &form.horizon_days)?,
            filter,
            observer,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Accepts `dd/mm/yyyy` or ISO `yyyy-mm-dd`.
pub fn parse_start_date(raw: &str) -> Result<NaiveDate, InvalidInput> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|_| {
            InvalidInput::new(
                "start date",
                format!("`{raw}` is not dd/mm/yyyy or yyyy-mm-dd"),
            )
        })
}

fn parse_field<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, InvalidInput> {
    let raw = raw.trim();
    raw.parse()
        .map_err(|_| InvalidInput::new(field, format!("`{raw}` is not a number")))
}
