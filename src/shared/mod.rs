//! Shared utilities for sensor-dashboard

use rmcp::ErrorData as McpError;

/// Format a reading value the way the dashboard shows numbers
///
/// Whole values drop their fraction (`10.0` -> `"10"`).
pub fn format_number(value: f64) -> String {
    value.to_string()
}

/// Format an optional reading value, absent values render as an empty slot
pub fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

/// Clamp a caller-supplied millisecond period, zero falls back to the default
pub fn period_or(ms: Option<u64>, default_ms: u64) -> u64 {
    ms.filter(|ms| *ms > 0).unwrap_or(default_ms)
}

/// Create an internal error
pub fn internal_error(msg: impl Into<String>) -> McpError {
    McpError::internal_error(msg.into(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(-0.25), "-0.25");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some(3.0)), "3");
        assert_eq!(format_optional(None), "");
    }

    #[test]
    fn test_period_or() {
        assert_eq!(period_or(None, 100), 100);
        assert_eq!(period_or(Some(0), 100), 100);
        assert_eq!(period_or(Some(250), 100), 250);
    }
}
