//! Text formatting for load progress and playback clocks.

use std::str::FromStr;

use crate::error::WaveError;

/// Format a ratio as a percentage with at most `fixed` decimals.
///
/// Trailing zeros are dropped (`0.125` at 2 decimals is `"12.5%"`). Zero
/// formats as `"0"` without a sign, and a non-finite ratio as `""`.
pub fn format_percent(rate: f64, fixed: usize) -> String {
    if !rate.is_finite() {
        return String::new();
    }
    if rate == 0.0 {
        return "0".to_string();
    }
    let rounded = format!("{:.*}", fixed, rate * 100.0);
    let value = rounded.parse::<f64>().unwrap_or(0.0);
    // Rounding can produce negative zero.
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{}%", value)
}

/// Format seconds as `hh:mm:ss` with `decimals` fractional digits.
///
/// Hours wrap at 24. Seconds are rounded to `decimals` places and printed
/// without trailing zeros, so `5.5` at two decimals reads `05.5`.
pub fn clock_format(seconds: f64, decimals: usize) -> String {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let hours = (seconds / 3600.0).trunc() as u64 % 24;
    let minutes = (seconds / 60.0).trunc() as u64 % 60;
    let secs = format!("{:.*}", decimals, seconds % 60.0)
        .parse::<f64>()
        .unwrap_or(0.0);

    let pad = |value: String, small: bool| if small { format!("0{}", value) } else { value };
    format!(
        "{}:{}:{}",
        pad(hours.to_string(), hours < 10),
        pad(minutes.to_string(), minutes < 10),
        pad(secs.to_string(), secs < 10.0)
    )
}

/// Display style for playback positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    Seconds,
    Thousandths,
    #[default]
    Clock,
    ClockTenths,
    ClockHundredths,
    ClockThousandths,
}

impl TimeFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Thousandths => "thousandths",
            Self::Clock => "hh:mm:ss",
            Self::ClockTenths => "hh:mm:ss.u",
            Self::ClockHundredths => "hh:mm:ss.uu",
            Self::ClockThousandths => "hh:mm:ss.uuu",
        }
    }
}

impl FromStr for TimeFormat {
    type Err = WaveError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "seconds" => Ok(Self::Seconds),
            "thousandths" => Ok(Self::Thousandths),
            "hh:mm:ss" => Ok(Self::Clock),
            "hh:mm:ss.u" => Ok(Self::ClockTenths),
            "hh:mm:ss.uu" => Ok(Self::ClockHundredths),
            "hh:mm:ss.uuu" => Ok(Self::ClockThousandths),
            other => Err(WaveError::InvalidParameter(format!(
                "unknown time format: {}",
                other
            ))),
        }
    }
}

pub fn format_time(seconds: f64, format: TimeFormat) -> String {
    match format {
        TimeFormat::Seconds => format!("{:.0}", seconds),
        TimeFormat::Thousandths => format!("{:.3}", seconds),
        TimeFormat::Clock => clock_format(seconds, 0),
        TimeFormat::ClockTenths => clock_format(seconds, 1),
        TimeFormat::ClockHundredths => clock_format(seconds, 2),
        TimeFormat::ClockThousandths => clock_format(seconds, 3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(f64::NAN, 2), "");
        assert_eq!(format_percent(0.0, 2), "0");
        assert_eq!(format_percent(1.0, 2), "100%");
        assert_eq!(format_percent(0.5, 2), "50%");
        assert_eq!(format_percent(0.123456, 2), "12.35%");
        assert_eq!(format_percent(0.1, 0), "10%");
        assert_eq!(format_percent(-0.00001, 2), "0%");
    }

    #[test]
    fn clock_pads_and_trims() {
        assert_eq!(clock_format(0.0, 0), "00:00:00");
        assert_eq!(clock_format(5.5, 2), "00:00:05.5");
        assert_eq!(clock_format(65.25, 2), "00:01:05.25");
        assert_eq!(clock_format(3_723.0, 0), "01:02:03");
        assert_eq!(clock_format(86_400.0 + 61.0, 0), "00:01:01");
        assert_eq!(clock_format(12.0, 3), "00:00:12");
    }

    #[test]
    fn named_formats() {
        let format: TimeFormat = "hh:mm:ss.uuu".parse().unwrap();
        assert_eq!(format_time(61.5, format), "00:01:01.5");
        assert_eq!(format_time(61.5049, "hh:mm:ss.uu".parse().unwrap()), "00:01:01.5");
        assert_eq!(format_time(2.4, TimeFormat::Seconds), "2");
        assert_eq!(format_time(2.4, TimeFormat::Thousandths), "2.400");
        assert_eq!(format_time(9.96, TimeFormat::ClockTenths), "00:00:10");
        assert!("mm:ss".parse::<TimeFormat>().is_err());
        assert_eq!(TimeFormat::Clock.as_str(), "hh:mm:ss");
    }
}
