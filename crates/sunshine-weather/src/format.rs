//! Temperature display strings.

use sunshine_core::{RequestUnits, TemperatureUnit};

/// Format a raw provider temperature for the watch face.
///
/// `value` is in the unit system the provider was asked for. The result is
/// converted to `display`, rounded half away from zero and suffixed with a
/// degree sign, e.g. `"25°"`.
pub fn format_temperature(value: f64, units: RequestUnits, display: TemperatureUnit) -> String {
    let shown = convert(value, units, display).round();
    // -0.4 rounds to -0.0, which must print as 0
    let whole = if shown == 0.0 { 0 } else { shown as i64 };
    format!("{}°", whole)
}

fn convert(value: f64, units: RequestUnits, display: TemperatureUnit) -> f64 {
    let celsius = match units {
        RequestUnits::Metric => value,
        RequestUnits::Imperial => (value - 32.0) * 5.0 / 9.0,
        RequestUnits::Standard => value - 273.15,
    };

    match (units, display) {
        (_, TemperatureUnit::Auto) => value,
        (RequestUnits::Imperial, TemperatureUnit::Fahrenheit) => value,
        (RequestUnits::Metric, TemperatureUnit::Celsius) => value,
        (_, TemperatureUnit::Celsius) => celsius,
        (_, TemperatureUnit::Fahrenheit) => celsius * 9.0 / 5.0 + 32.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_keeps_provider_unit() {
        assert_eq!(
            format_temperature(298.0, RequestUnits::Metric, TemperatureUnit::Auto),
            "298°"
        );
        assert_eq!(
            format_temperature(71.6, RequestUnits::Imperial, TemperatureUnit::Auto),
            "72°"
        );
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        let c = TemperatureUnit::Celsius;
        assert_eq!(format_temperature(20.5, RequestUnits::Metric, c), "21°");
        assert_eq!(format_temperature(20.49, RequestUnits::Metric, c), "20°");
        assert_eq!(format_temperature(-3.5, RequestUnits::Metric, c), "-4°");
    }

    #[test]
    fn test_small_negative_is_zero() {
        assert_eq!(
            format_temperature(-0.4, RequestUnits::Metric, TemperatureUnit::Celsius),
            "0°"
        );
    }

    #[test]
    fn test_metric_to_fahrenheit() {
        assert_eq!(
            format_temperature(20.0, RequestUnits::Metric, TemperatureUnit::Fahrenheit),
            "68°"
        );
        assert_eq!(
            format_temperature(-40.0, RequestUnits::Metric, TemperatureUnit::Fahrenheit),
            "-40°"
        );
    }

    #[test]
    fn test_imperial_to_celsius() {
        assert_eq!(
            format_temperature(212.0, RequestUnits::Imperial, TemperatureUnit::Celsius),
            "100°"
        );
    }

    #[test]
    fn test_kelvin_conversions() {
        assert_eq!(
            format_temperature(298.0, RequestUnits::Standard, TemperatureUnit::Celsius),
            "25°"
        );
        assert_eq!(
            format_temperature(273.15, RequestUnits::Standard, TemperatureUnit::Fahrenheit),
            "32°"
        );
    }

    #[test]
    fn test_is_deterministic() {
        let a = format_temperature(17.77, RequestUnits::Metric, TemperatureUnit::Fahrenheit);
        let b = format_temperature(17.77, RequestUnits::Metric, TemperatureUnit::Fahrenheit);
        assert_eq!(a, b);
    }
}
