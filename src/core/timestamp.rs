//! Time and duration encoding
//!
//! Decides how timestamps and durations are rendered by the encoders:
//! as epoch numbers, as ISO 8601 / RFC 3339 text, as a custom strftime
//! layout, or for durations as Go-style text such as `1.5s`.

use super::encoder::Primitive;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write;
use std::time::Duration;

/// How timestamps are rendered
///
/// # Examples
///
/// ```
/// use rust_structured_logger::core::{Primitive, TimeEncoder};
/// use chrono::{TimeZone, Utc};
///
/// let ts = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// let encoded = TimeEncoder::Custom("%H:%M:%S".to_string()).encode(&ts);
/// assert_eq!(encoded, Primitive::Text("10:30:45".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TimeEncoder {
    /// Floating-point seconds since the epoch: `1736332245.123456`
    #[default]
    Epoch,

    /// Floating-point milliseconds since the epoch: `1736332245123.456`
    EpochMillis,

    /// Integer nanoseconds since the epoch: `1736332245123456000`
    EpochNanos,

    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// RFC 3339 with second precision: `2025-01-08T10:30:45Z`
    Rfc3339,

    /// RFC 3339 with nanosecond precision: `2025-01-08T10:30:45.123456000Z`
    Rfc3339Nano,

    /// Custom strftime layout
    ///
    /// ```
    /// use rust_structured_logger::core::TimeEncoder;
    ///
    /// // Wall clock only, as used by interactive tools
    /// let encoder = TimeEncoder::Custom("%H:%M:%S".to_string());
    /// ```
    Custom(String),
}

impl TimeEncoder {
    /// Resolve an encoder from its configuration name.
    ///
    /// Unknown names fall back to [`TimeEncoder::Epoch`]; a name containing
    /// `%` is taken as a strftime layout when every specifier in it is valid,
    /// and also falls back to `Epoch` otherwise.
    pub fn from_name(name: &str) -> Self {
        match name {
            "rfc3339nano" | "RFC3339Nano" => TimeEncoder::Rfc3339Nano,
            "rfc3339" | "RFC3339" => TimeEncoder::Rfc3339,
            "iso8601" | "ISO8601" => TimeEncoder::Iso8601,
            "millis" => TimeEncoder::EpochMillis,
            "nanos" => TimeEncoder::EpochNanos,
            layout if layout.contains('%') && is_valid_layout(layout) => {
                TimeEncoder::Custom(layout.to_string())
            }
            _ => TimeEncoder::Epoch,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TimeEncoder::Epoch => "epoch",
            TimeEncoder::EpochMillis => "millis",
            TimeEncoder::EpochNanos => "nanos",
            TimeEncoder::Iso8601 => "iso8601",
            TimeEncoder::Rfc3339 => "rfc3339",
            TimeEncoder::Rfc3339Nano => "rfc3339nano",
            TimeEncoder::Custom(layout) => layout,
        }
    }

    #[must_use]
    pub fn encode(&self, datetime: &DateTime<Utc>) -> Primitive {
        match self {
            TimeEncoder::Epoch => {
                let secs = datetime.timestamp() as f64;
                let frac = f64::from(datetime.timestamp_subsec_nanos()) / 1e9;
                Primitive::Float(secs + frac)
            }
            TimeEncoder::EpochMillis => {
                let millis = datetime.timestamp_millis() as f64;
                let frac = f64::from(datetime.timestamp_subsec_nanos() % 1_000_000) / 1e6;
                Primitive::Float(millis + frac)
            }
            TimeEncoder::EpochNanos => {
                Primitive::Int(datetime.timestamp_nanos_opt().unwrap_or(i64::MAX))
            }
            TimeEncoder::Iso8601 => {
                Primitive::Text(datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
            }
            TimeEncoder::Rfc3339 => {
                Primitive::Text(datetime.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            TimeEncoder::Rfc3339Nano => {
                Primitive::Text(datetime.to_rfc3339_opts(SecondsFormat::Nanos, true))
            }
            TimeEncoder::Custom(layout) => {
                let mut out = String::new();
                match write!(out, "{}", datetime.format(layout)) {
                    Ok(()) => Primitive::Text(out),
                    // invalid layouts built by hand render as RFC 3339
                    Err(_) => Primitive::Text(datetime.to_rfc3339_opts(SecondsFormat::Secs, true)),
                }
            }
        }
    }
}

fn is_valid_layout(layout: &str) -> bool {
    !StrftimeItems::new(layout).any(|item| matches!(item, Item::Error))
}

/// How durations are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DurationEncoder {
    /// Floating-point seconds: `1.5`
    #[default]
    Seconds,
    /// Integer nanoseconds: `1500000000`
    Nanos,
    /// Integer milliseconds: `1500`
    Millis,
    /// Human-readable text: `1.5s`, `1m30s`, `250ms`
    String,
}

impl DurationEncoder {
    /// Resolve an encoder from its configuration name; unknown names fall
    /// back to [`DurationEncoder::Seconds`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "string" => DurationEncoder::String,
            "nanos" => DurationEncoder::Nanos,
            "ms" => DurationEncoder::Millis,
            _ => DurationEncoder::Seconds,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DurationEncoder::Seconds => "seconds",
            DurationEncoder::Nanos => "nanos",
            DurationEncoder::Millis => "ms",
            DurationEncoder::String => "string",
        }
    }

    #[must_use]
    pub fn encode(&self, duration: Duration) -> Primitive {
        match self {
            DurationEncoder::Seconds => Primitive::Float(duration.as_secs_f64()),
            DurationEncoder::Nanos => {
                Primitive::Int(i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX))
            }
            DurationEncoder::Millis => {
                Primitive::Int(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
            }
            DurationEncoder::String => Primitive::Text(format_duration(duration)),
        }
    }
}

/// Render a duration the way operators read them: `0s`, `750ns`, `1.5µs`,
/// `20ms`, `1s`, `1m30s`, `2h0m5.25s`.
pub fn format_duration(duration: Duration) -> String {
    const MICRO: u128 = 1_000;
    const MILLI: u128 = 1_000_000;
    const SECOND: u128 = 1_000_000_000;
    const MINUTE: u128 = 60 * SECOND;
    const HOUR: u128 = 60 * MINUTE;

    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < MICRO {
        return format!("{}ns", nanos);
    }
    if nanos < MILLI {
        return format!("{}µs", decimal(nanos, MICRO));
    }
    if nanos < SECOND {
        return format!("{}ms", decimal(nanos, MILLI));
    }

    let mut out = String::new();
    let hours = nanos / HOUR;
    let minutes = (nanos % HOUR) / MINUTE;
    if hours > 0 {
        let _ = write!(out, "{}h", hours);
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{}m", minutes);
    }
    let _ = write!(out, "{}s", decimal(nanos % MINUTE, SECOND));
    out
}

/// `value / unit` with the fractional part written out and trailing zeros
/// trimmed. `unit` must be a power of ten.
fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }

    let width = unit.ilog10() as usize;
    let digits = format!("{:0width$}", frac, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.123456 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::microseconds(123456)
    }

    #[test]
    fn test_iso8601_format() {
        let result = TimeEncoder::Iso8601.encode(&fixed_datetime());
        assert_eq!(result, Primitive::Text("2025-01-08T10:30:45.123Z".to_string()));
    }

    #[test]
    fn test_rfc3339_formats() {
        let result = TimeEncoder::Rfc3339.encode(&fixed_datetime());
        assert_eq!(result, Primitive::Text("2025-01-08T10:30:45Z".to_string()));

        let result = TimeEncoder::Rfc3339Nano.encode(&fixed_datetime());
        assert_eq!(
            result,
            Primitive::Text("2025-01-08T10:30:45.123456000Z".to_string())
        );
    }

    #[test]
    fn test_epoch_formats() {
        let ts = fixed_datetime();
        let Primitive::Float(secs) = TimeEncoder::Epoch.encode(&ts) else {
            panic!("epoch should be a float");
        };
        assert!((secs - 1736332245.123456).abs() < 1e-5);

        let Primitive::Float(millis) = TimeEncoder::EpochMillis.encode(&ts) else {
            panic!("millis should be a float");
        };
        assert!((millis - 1736332245123.456).abs() < 1e-2);

        assert_eq!(
            TimeEncoder::EpochNanos.encode(&ts),
            Primitive::Int(1_736_332_245_123_456_000)
        );
    }

    #[test]
    fn test_custom_format() {
        let format = TimeEncoder::Custom("%Y/%m/%d %H:%M".to_string());
        assert_eq!(
            format.encode(&fixed_datetime()),
            Primitive::Text("2025/01/08 10:30".to_string())
        );
    }

    #[test]
    fn test_time_encoder_names() {
        assert_eq!(TimeEncoder::from_name("ISO8601"), TimeEncoder::Iso8601);
        assert_eq!(TimeEncoder::from_name("nanos"), TimeEncoder::EpochNanos);
        assert_eq!(TimeEncoder::from_name("bogus"), TimeEncoder::Epoch);
        assert_eq!(
            TimeEncoder::from_name("%H:%M:%S"),
            TimeEncoder::Custom("%H:%M:%S".to_string())
        );
        assert_eq!(TimeEncoder::from_name("%Q"), TimeEncoder::Epoch);
        assert_eq!(TimeEncoder::from_name("%H:%"), TimeEncoder::Epoch);
    }

    #[test]
    fn test_invalid_custom_layout_does_not_panic() {
        let ts = fixed_datetime();
        for layout in ["%Q", "%H:%"] {
            assert_eq!(
                TimeEncoder::Custom(layout.to_string()).encode(&ts),
                Primitive::Text("2025-01-08T10:30:45Z".to_string())
            );
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_nanos(750)), "750ns");
        assert_eq!(format_duration(Duration::from_nanos(1500)), "1.5µs");
        assert_eq!(format_duration(Duration::from_millis(20)), "20ms");
        assert_eq!(format_duration(Duration::from_secs(1)), "1s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m0s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_millis(7_205_250)), "2h0m5.25s");
    }

    #[test]
    fn test_duration_encoders() {
        let d = Duration::from_millis(1500);
        assert_eq!(DurationEncoder::Seconds.encode(d), Primitive::Float(1.5));
        assert_eq!(DurationEncoder::Nanos.encode(d), Primitive::Int(1_500_000_000));
        assert_eq!(DurationEncoder::Millis.encode(d), Primitive::Int(1500));
        assert_eq!(DurationEncoder::String.encode(d), Primitive::Text("1.5s".into()));
        assert_eq!(DurationEncoder::from_name("unknown"), DurationEncoder::Seconds);
    }
}
