//! Remote element-set catalog client.
//!
//! One GET per designator, explicit timeout, no retries. Retrying is left to
//! whoever triggered the refresh.

use std::time::Duration;

use pass_core::{SatelliteId, TleFormatError, TwoLineElement};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("catalog answered with status {0}")]
    Status(u16),
    #[error("catalog response has {0} line(s), expected a name line and a TLE pair")]
    MissingLines(usize),
    #[error("catalog returned a malformed TLE: {0}")]
    MalformedTle(#[from] TleFormatError),
}

/// Anything that can produce a fresh element set for a designator.
pub trait CatalogSource {
    fn fetch(&self, id: &SatelliteId) -> Result<TwoLineElement, FetchError>;
}

/// Celestrak-style catalog endpoint: `GET <base_url>?<param>=<id>&FORMAT=TLE`.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    client: Client,
    base_url: String,
    query_param: String,
    timeout: Duration,
}

impl HttpCatalog {
    pub fn new(
        base_url: impl Into<String>,
        query_param: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            query_param: query_param.into(),
            timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(err)
        }
    }
}

impl CatalogSource for HttpCatalog {
    fn fetch(&self, id: &SatelliteId) -> Result<TwoLineElement, FetchError> {
        debug!(designator = %id, url = %self.base_url, "fetching element set");
        let response = self
            .client
            .get(&self.base_url)
            .query(&[(self.query_param.as_str(), id.as_str()), ("FORMAT", "TLE")])
            .send()
            .map_err(|err| self.classify(err))?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.text().map_err(|err| self.classify(err))?;
        parse_catalog_body(&body)
    }
}

/// Extract the TLE pair from a catalog body: name on the first line, the
/// element set on the second and third.
pub fn parse_catalog_body(body: &str) -> Result<TwoLineElement, FetchError> {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect();
    match lines.as_slice() {
        [_, line1, line2, ..] => Ok(TwoLineElement::new(*line1, *line2)?),
        other => Err(FetchError::MissingLines(other.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "NOAA 19                 \r\n\
1 33591U 09005A   22020.44937208  .00000081  00000-0  68837-4 0  9993\r\n\
2 33591  99.1663  51.3451 0013122 241.8520 118.1325 14.12523655667551\r\n";

    #[test]
    fn takes_second_and_third_lines() {
        let tle = parse_catalog_body(BODY).unwrap();
        assert!(tle.line1().starts_with("1 33591U"));
        assert!(tle.line2().starts_with("2 33591 "));
    }

    #[test]
    fn no_data_reply_is_rejected() {
        assert!(matches!(
            parse_catalog_body("No GP data found"),
            Err(FetchError::MissingLines(1))
        ));
    }

    #[test]
    fn garbage_pair_is_rejected() {
        assert!(matches!(
            parse_catalog_body("name\nfoo\nbar\n"),
            Err(FetchError::MalformedTle(_))
        ));
    }

    #[test]
    fn refused_connection_is_a_network_error() {
        let catalog =
            HttpCatalog::new("http://127.0.0.1:9/gp.php", "INTDES", Duration::from_secs(2))
                .unwrap();
        let id = SatelliteId::new("33591").unwrap();
        assert!(matches!(
            catalog.fetch(&id),
            Err(FetchError::Network(_) | FetchError::Timeout(_))
        ));
    }
}
