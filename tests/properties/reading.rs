//! Property tests for reading format/parse and the simulator range.

use proptest::prelude::*;
use std::path::Path;

use thermowatch::{Reading, SensorSimulator};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Any canonical wire line round-trips through parse and
    /// format unchanged.
    #[test]
    fn property_reading_round_trip(
        hundredths in 0u32..1_000_000,
        timestamp in any::<u32>(),
    ) {
        let line = format!("{}.{:02},{}\n", hundredths / 100, hundredths % 100, timestamp);
        let parsed = Reading::parse_line(&line, Path::new("t")).unwrap();
        prop_assert_eq!(parsed.format_line(), line);
    }

    /// PROPERTY: The rendered value always carries exactly two decimals and
    /// the line is newline-terminated with two comma-separated fields.
    #[test]
    fn property_format_line_shape(
        value in 0.0f64..1000.0,
        timestamp in any::<u64>(),
    ) {
        let line = Reading::new(value, timestamp).format_line();
        prop_assert!(line.ends_with('\n'));

        let trimmed = line.trim_end();
        let fields: Vec<&str> = trimmed.split(',').collect();
        prop_assert_eq!(fields.len(), 2);

        let decimals = fields[0].split('.').nth(1).map(str::len);
        prop_assert_eq!(decimals, Some(2));
        prop_assert!(fields[1].chars().all(|c| c.is_ascii_digit()));
    }

    /// PROPERTY: `parse_line` never panics on arbitrary input.
    #[test]
    fn property_parse_line_never_panics(
        line in "(?s).{0,128}"
    ) {
        let _ = Reading::parse_line(&line, Path::new("t"));
    }

    /// PROPERTY: Samples stay inside any valid configured range, both as a
    /// raw value and after two-decimal rendering. Bounds are drawn on the
    /// hundredths grid, matching how ranges are configured in practice.
    #[test]
    fn property_sample_in_range(
        min_hundredths in -5000i32..5000,
        width_hundredths in 50i32..1000,
    ) {
        let min = f64::from(min_hundredths) / 100.0;
        let max = f64::from(min_hundredths + width_hundredths) / 100.0;
        let sensor = SensorSimulator::new(min, max).unwrap();
        let reading = sensor.sample();
        prop_assert!(reading.value >= min && reading.value < max);

        let line = reading.format_line();
        let rendered: f64 = line.split(',').next().unwrap().parse().unwrap();
        prop_assert!(rendered >= min && rendered < max);
    }
}
