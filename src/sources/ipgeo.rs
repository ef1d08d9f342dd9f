//! Position from IP geolocation (ipinfo.io)
//!
//! City-level only: altitude, heading and speed are never known.

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::sensors::error::PositionErrorCode;
use crate::sensors::geolocation::{Coordinates, GeoOptions, Position};
use crate::sensors::latency::Clock;
use crate::sensors::watch::{ReadingStream, Watch};
use crate::sensors::SensorError;

pub const ENDPOINT: &str = "https://ipinfo.io/json";

/// How often the watch delivers a position
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Radius reported as accuracy for a city-level fix, in meters
pub const CITY_ACCURACY_M: f64 = 5000.0;

/// Response from ipinfo.io, only the fields used here
#[derive(Debug, Deserialize)]
struct IpInfo {
    #[serde(default)]
    loc: Option<String>,
}

/// Parse ipinfo's `"lat,lon"` location string
pub fn parse_loc(loc: &str) -> Option<(f64, f64)> {
    let (lat, lon) = loc.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    let valid = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon);
    valid.then_some((lat, lon))
}

fn fix_from(lat: f64, lon: f64, timestamp: i64) -> Position {
    Position {
        coords: Coordinates {
            latitude: lat,
            longitude: lon,
            altitude: None,
            accuracy: CITY_ACCURACY_M,
            altitude_accuracy: None,
            heading: None,
            speed: None,
        },
        timestamp,
    }
}

pub struct IpGeolocation {
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
    endpoint: String,
}

impl IpGeolocation {
    /// Watch positions from an ipinfo-compatible `endpoint`, usually [`ENDPOINT`]
    pub fn new(client: reqwest::Client, clock: Arc<dyn Clock>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            clock,
            endpoint: endpoint.into(),
        }
    }
}

struct Poller {
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
    endpoint: String,
    options: GeoOptions,
    cached: Option<(Instant, Position)>,
}

impl Poller {
    async fn fetch(&self) -> Result<Position, SensorError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/json")
            .timeout(self.options.timeout)
            .send()
            .await
            .map_err(request_error)?;

        let info: IpInfo = response.json().await.map_err(request_error)?;

        let (lat, lon) = info.loc.as_deref().and_then(parse_loc).ok_or_else(|| {
            SensorError::position(PositionErrorCode::PositionUnavailable, "no location in response")
        })?;

        Ok(fix_from(lat, lon, self.clock.now_ms()))
    }

    /// Cached fix if young enough, otherwise a fresh one
    async fn next(&mut self) -> Result<Position, SensorError> {
        if let Some((taken, position)) = self.cached {
            if taken.elapsed() <= self.options.maximum_age {
                return Ok(position);
            }
        }

        let position = self.fetch().await?;
        self.cached = Some((Instant::now(), position));
        Ok(position)
    }
}

fn request_error(e: reqwest::Error) -> SensorError {
    let code = if e.is_timeout() {
        PositionErrorCode::Timeout
    } else {
        PositionErrorCode::PositionUnavailable
    };
    SensorError::position(code, e.to_string())
}

impl Watch for IpGeolocation {
    type Reading = Position;
    type Options = GeoOptions;

    fn watch(&self, options: GeoOptions) -> Result<ReadingStream<Position>, SensorError> {
        if options.enable_high_accuracy {
            tracing::debug!("High accuracy requested, IP geolocation is city-level only");
        }

        let poller = Poller {
            client: self.client.clone(),
            clock: Arc::clone(&self.clock),
            endpoint: self.endpoint.clone(),
            options,
            cached: None,
        };
        let readings = stream::unfold((poller, true), move |(mut poller, first)| async move {
            if !first {
                tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
            }
            let reading = poller.next().await;
            Some((reading, (poller, false)))
        });

        Ok(readings.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testing::FixedClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Local HTTP server answering every request with `body`, counting requests
    async fn answering(body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/json", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = [0u8; 2048];
                let _ = socket.read(&mut request).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (url, hits)
    }

    /// Local server that accepts connections and never answers
    async fn stalling() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/json", listener.local_addr().unwrap());

        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        url
    }

    fn poller(endpoint: String, options: GeoOptions) -> Poller {
        Poller {
            client: reqwest::Client::new(),
            clock: Arc::new(FixedClock(1_234)),
            endpoint,
            options,
            cached: None,
        }
    }

    fn position_code(result: Result<Position, SensorError>) -> Option<u16> {
        match result {
            Err(SensorError::Position { code, .. }) => Some(code.code()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_fix_from_endpoint() {
        let (url, _) = answering(r#"{"ip":"192.0.2.1","loc":"48.8566,2.3522"}"#).await;
        let mut poller = poller(url, GeoOptions::default());

        let fix = poller.next().await.unwrap();
        assert_eq!((fix.coords.latitude, fix.coords.longitude), (48.8566, 2.3522));
        assert_eq!(fix.coords.accuracy, CITY_ACCURACY_M);
        assert_eq!(fix.timestamp, 1_234);
    }

    #[tokio::test]
    async fn test_young_fix_served_from_cache() {
        let (url, hits) = answering(r#"{"loc":"48.8566,2.3522"}"#).await;
        let mut poller = poller(url, GeoOptions::default());

        let first = poller.next().await.unwrap();
        let second = poller.next().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_fix_refetched() {
        let (url, hits) = answering(r#"{"loc":"48.8566,2.3522"}"#).await;
        let options = GeoOptions {
            maximum_age: Duration::ZERO,
            ..GeoOptions::default()
        };
        let mut poller = poller(url, options);

        poller.next().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        poller.next().await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_loc_is_position_unavailable() {
        let (url, _) = answering("{}").await;
        let mut poller = poller(url, GeoOptions::default());

        assert_eq!(position_code(poller.next().await), Some(2));
    }

    #[tokio::test]
    async fn test_stalled_endpoint_times_out() {
        let url = stalling().await;
        let options = GeoOptions {
            timeout: Duration::from_millis(200),
            ..GeoOptions::default()
        };
        let mut poller = poller(url, options);

        assert_eq!(position_code(poller.next().await), Some(3));
    }

    #[tokio::test]
    async fn test_watch_delivers_first_fix_at_once() {
        let (url, _) = answering(r#"{"loc":"-33.86,151.21"}"#).await;
        let source = IpGeolocation::new(reqwest::Client::new(), Arc::new(FixedClock(0)), url);

        let mut readings = source.watch(GeoOptions::default()).unwrap();
        let fix = readings.next().await.unwrap().unwrap();
        assert_eq!(fix.coords.latitude, -33.86);
    }

    #[test]
    fn test_parse_loc() {
        assert_eq!(parse_loc("52.5200,13.4050"), Some((52.52, 13.405)));
        assert_eq!(parse_loc(" -33.86 , 151.21 "), Some((-33.86, 151.21)));
    }

    #[test]
    fn test_parse_loc_rejects_garbage() {
        assert_eq!(parse_loc(""), None);
        assert_eq!(parse_loc("52.52"), None);
        assert_eq!(parse_loc("north,east"), None);
        assert_eq!(parse_loc("95.0,10.0"), None);
    }

    #[test]
    fn test_fix_is_city_level() {
        let fix = fix_from(1.0, 2.0, 99);
        assert_eq!(fix.coords.accuracy, CITY_ACCURACY_M);
        assert_eq!(fix.coords.altitude, None);
        assert_eq!(fix.coords.speed, None);
        assert_eq!(fix.timestamp, 99);
    }
}
