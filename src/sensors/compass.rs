//! Compass heading monitor

use std::sync::Arc;

use super::error::CompassErrorCode;
use super::latency::{Clock, LatencyTracker};
use super::watch::{Watch, WatchHandle, WatchOptions, WatchSlot};
use super::{SensorError, Start};
use crate::display::{Screen, Slot};
use crate::shared::{format_number, period_or};

pub const DEFAULT_FREQUENCY_MS: u64 = 100;

/// Alert raised when the compass is started a second time
pub const ALREADY_WATCHING_ALERT: &str = "Error!";

/// One compass reading, headings in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heading {
    pub magnetic_heading: f64,
    pub true_heading: f64,
    pub heading_accuracy: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

pub type HeadingWatch = dyn Watch<Reading = Heading, Options = WatchOptions>;

pub struct CompassMonitor {
    source: Arc<HeadingWatch>,
    screen: Arc<dyn Screen>,
    clock: Arc<dyn Clock>,
    slot: WatchSlot,
}

impl CompassMonitor {
    pub fn new(source: Arc<HeadingWatch>, screen: Arc<dyn Screen>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            screen,
            clock,
            slot: WatchSlot::default(),
        }
    }

    /// Start watching the heading every `frequency_ms` (default 100).
    ///
    /// A second call while the watch is active raises an alert instead of
    /// subscribing again.
    pub fn init(&self, frequency_ms: Option<u64>) -> Result<Start, SensorError> {
        let frequency_ms = period_or(frequency_ms, DEFAULT_FREQUENCY_MS);

        let outcome = self.slot.start_once(|| {
            let readings = self.source.watch(WatchOptions::every_ms(frequency_ms))?;
            let screen = Arc::clone(&self.screen);
            let mut latency = LatencyTracker::starting_at(self.clock.now_ms());

            Ok(WatchHandle::spawn(readings, move |event| match event {
                Ok(heading) => show_heading(screen.as_ref(), &mut latency, &heading),
                Err(e) => show_error(screen.as_ref(), &e),
            }))
        })?;

        match outcome {
            Start::Started => tracing::info!("Compass watch started (every {} ms)", frequency_ms),
            Start::AlreadyActive => self.screen.alert(ALREADY_WATCHING_ALERT),
        }

        Ok(outcome)
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_active()
    }

    pub fn cancel(&self) {
        self.slot.cancel()
    }

    /// Wait until the heading stream ends
    pub async fn finished(&self) {
        self.slot.finished().await
    }
}

fn show_heading(screen: &dyn Screen, latency: &mut LatencyTracker, heading: &Heading) {
    screen.write(Slot::MagneticHeading, &format_number(heading.magnetic_heading));
    screen.write(Slot::TrueHeading, &format_number(heading.true_heading));
    screen.write(Slot::HeadingAccuracy, &format_number(heading.heading_accuracy));

    if let Some(delta) = latency.observe(heading.timestamp) {
        screen.write(Slot::TimestampCompass, &delta.to_string());
    }
}

fn show_error(screen: &dyn Screen, error: &SensorError) {
    let code = match error {
        SensorError::Compass(code) => *code,
        other => {
            tracing::debug!("Compass watch failed: {}", other);
            CompassErrorCode::Internal
        }
    };
    screen.write(Slot::MagneticHeading, &format!("Error! {}", code.code()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Board;
    use crate::sensors::testing::{FixedClock, ScriptedWatch};

    fn heading(magnetic: f64, true_heading: f64, accuracy: f64, timestamp: i64) -> Heading {
        Heading {
            magnetic_heading: magnetic,
            true_heading,
            heading_accuracy: accuracy,
            timestamp,
        }
    }

    fn monitor(
        source: &Arc<ScriptedWatch<Heading, WatchOptions>>,
        board: &Arc<Board>,
        now: i64,
    ) -> CompassMonitor {
        CompassMonitor::new(source.clone(), board.clone(), Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn test_readings_fill_slots() {
        let source = Arc::new(ScriptedWatch::new(vec![
            Ok(heading(12.5, 10.0, 1.2, 1000)),
            Ok(heading(13.0, 10.5, 1.1, 1100)),
        ]));
        let board = Arc::new(Board::new());
        let compass = monitor(&source, &board, 0);

        assert_eq!(compass.init(None).unwrap(), Start::Started);
        compass.finished().await;

        assert_eq!(board.get(Slot::MagneticHeading).as_deref(), Some("13"));
        assert_eq!(board.get(Slot::TrueHeading).as_deref(), Some("10.5"));
        assert_eq!(board.get(Slot::HeadingAccuracy).as_deref(), Some("1.1"));
        assert_eq!(board.get(Slot::TimestampCompass).as_deref(), Some("100"));
        assert_eq!(board.write_count(Slot::TimestampCompass), 2);
    }

    #[tokio::test]
    async fn test_default_and_custom_frequency() {
        let source = Arc::new(ScriptedWatch::new(vec![]));
        let board = Arc::new(Board::new());
        monitor(&source, &board, 0).init(None).unwrap();
        monitor(&source, &board, 0).init(Some(0)).unwrap();
        monitor(&source, &board, 0).init(Some(250)).unwrap();

        assert_eq!(
            source.options(),
            vec![
                WatchOptions::every_ms(100),
                WatchOptions::every_ms(100),
                WatchOptions::every_ms(250),
            ]
        );
    }

    #[tokio::test]
    async fn test_second_init_alerts() {
        let source = Arc::new(ScriptedWatch::live(vec![]));
        let board = Arc::new(Board::new());
        let compass = monitor(&source, &board, 0);

        assert_eq!(compass.init(None).unwrap(), Start::Started);
        assert_eq!(compass.init(None).unwrap(), Start::AlreadyActive);

        assert_eq!(source.calls(), 1);
        assert_eq!(board.alerts(), vec!["Error!".to_string()]);
        assert!(compass.is_active());
    }

    #[tokio::test]
    async fn test_ended_watch_reports_inactive() {
        let source = Arc::new(ScriptedWatch::new(vec![Ok(heading(1.0, 1.0, 1.0, 10))]));
        let board = Arc::new(Board::new());
        let compass = monitor(&source, &board, 0);

        compass.init(None).unwrap();
        compass.finished().await;

        assert!(!compass.is_active());
        assert_eq!(compass.init(None).unwrap(), Start::AlreadyActive);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_error_written_inline_and_watch_continues() {
        let source = Arc::new(ScriptedWatch::new(vec![
            Err(SensorError::Compass(CompassErrorCode::NotSupported)),
            Ok(heading(90.0, 88.0, 2.0, 50)),
            Err(SensorError::Compass(CompassErrorCode::Internal)),
        ]));
        let board = Arc::new(Board::new());
        let compass = monitor(&source, &board, 0);

        compass.init(None).unwrap();
        compass.finished().await;

        assert_eq!(board.get(Slot::MagneticHeading).as_deref(), Some("Error! 0"));
        assert_eq!(board.get(Slot::TrueHeading).as_deref(), Some("88"));
        assert_eq!(board.write_count(Slot::MagneticHeading), 3);
        assert!(board.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_timestamp_skips_latency() {
        let source = Arc::new(ScriptedWatch::new(vec![
            Ok(heading(1.0, 1.0, 1.0, 700)),
            Ok(heading(2.0, 2.0, 1.0, 700)),
            Ok(heading(3.0, 3.0, 1.0, 750)),
        ]));
        let board = Arc::new(Board::new());
        let compass = monitor(&source, &board, 700);

        compass.init(None).unwrap();
        compass.finished().await;

        assert_eq!(board.write_count(Slot::MagneticHeading), 3);
        assert_eq!(board.write_count(Slot::TimestampCompass), 1);
        assert_eq!(board.get(Slot::TimestampCompass).as_deref(), Some("50"));
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        struct Unsupported;
        impl Watch for Unsupported {
            type Reading = Heading;
            type Options = WatchOptions;
            fn watch(
                &self,
                _options: WatchOptions,
            ) -> Result<crate::sensors::watch::ReadingStream<Heading>, SensorError> {
                Err(SensorError::NotSupported("compass"))
            }
        }

        let board = Arc::new(Board::new());
        let compass = CompassMonitor::new(Arc::new(Unsupported), board, Arc::new(FixedClock(0)));

        assert!(compass.init(None).is_err());
        assert!(!compass.is_active());
    }
}
