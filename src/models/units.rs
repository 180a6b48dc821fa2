//! Temperature unit conversion and rounding helpers

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unit a temperature value is expressed in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display)]
pub enum TemperatureUnit {
    /// Degrees Celsius
    C,
    /// Degrees Fahrenheit
    F,
}

/// Convert Celsius to Fahrenheit, rounded to one decimal
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    round_to(celsius * 9.0 / 5.0 + 32.0, 1)
}

/// Convert Fahrenheit to Celsius (unrounded)
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) / 1.8
}

/// Express a temperature in Celsius whatever unit it was stored in
pub fn normalize_temperature(value: f64, unit: TemperatureUnit) -> f64 {
    match unit {
        TemperatureUnit::F => fahrenheit_to_celsius(value),
        TemperatureUnit::C => value,
    }
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_celsius_to_fahrenheit() {
        assert_eq!(celsius_to_fahrenheit(0.0), 32.0);
        assert_eq!(celsius_to_fahrenheit(100.0), 212.0);
        assert_eq!(celsius_to_fahrenheit(21.37), 70.5);
    }

    #[test]
    fn test_fahrenheit_to_celsius() {
        assert!((fahrenheit_to_celsius(212.0) - 100.0).abs() < 1e-9);
        assert!((fahrenheit_to_celsius(41.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalization_is_noop_for_celsius() {
        let value = 23.4;
        let once = normalize_temperature(value, TemperatureUnit::C);
        let twice = normalize_temperature(once, TemperatureUnit::C);
        assert_eq!(once, value);
        assert_eq!(twice, value);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.789, 1), 1.8);
        assert_eq!(round_to(-4.4449, 3), -4.445);
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("F".parse::<TemperatureUnit>().unwrap(), TemperatureUnit::F);
        assert_eq!(TemperatureUnit::C.to_string(), "C");
    }
}
