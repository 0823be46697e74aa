//! Property-based tests for telemetry output parsing

use gpubar_core::monitoring::{FieldSet, GpuParser, UNREPORTED};
use proptest::prelude::*;

/// Strategy for one well-formed extended row's numeric fields
fn arb_row() -> impl Strategy<Value = (i64, i64, i64, i64, i64, Option<i64>, Option<u32>)> {
    (
        0i64..16,
        0i64..=100,
        0i64..110,
        0i64..100_000,
        1i64..200_000,
        proptest::option::of(0i64..=100),
        proptest::option::of(0u32..1000),
    )
}

fn render((index, util, temp, used, total, fan, draw): &(i64, i64, i64, i64, i64, Option<i64>, Option<u32>)) -> String {
    let fan = fan.map_or_else(|| "[N/A]".to_string(), |f| f.to_string());
    let draw = draw.map_or_else(|| "[Not Supported]".to_string(), |d| format!("{d}.25"));
    format!("{index}, GPU {index}, {util}, {temp}, {used}, {total}, {fan}, {draw}, 450.00, 550.54.14, 12.4")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// N valid rows parse into N records in the same order
    #[test]
    fn prop_rows_map_one_to_one(rows in proptest::collection::vec(arb_row(), 0..8)) {
        let output = rows.iter().map(render).collect::<Vec<_>>().join("\n\n");
        let snapshot = GpuParser::parse(&output, FieldSet::Extended).unwrap();
        prop_assert_eq!(snapshot.len(), rows.len());

        for (gpu, row) in snapshot.gpus().iter().zip(&rows) {
            prop_assert_eq!(gpu.index, row.0);
            prop_assert_eq!(gpu.utilization, row.1);
            prop_assert_eq!(gpu.temperature, row.2);
            prop_assert_eq!(gpu.mem_used, row.3);
            prop_assert_eq!(gpu.mem_total, row.4);
            prop_assert_eq!(gpu.fan_speed, row.5.unwrap_or(UNREPORTED));
            prop_assert_eq!(gpu.power_draw, row.6.map_or(UNREPORTED, i64::from));
            prop_assert_eq!(gpu.power_limit, 450);
        }
    }

    /// Any N/A spelling in a required field fails the whole query
    #[test]
    fn prop_required_na_is_fatal(
        rows in proptest::collection::vec(arb_row(), 1..5),
        victim in 0usize..5,
        column in prop::sample::select(vec![0usize, 2, 3, 4, 5]),
        spelling in prop::sample::select(vec!["N/A", "n/a", "[N/A]", "[Not Supported]", ""]),
    ) {
        let mut lines: Vec<String> = rows.iter().map(render).collect();
        let victim = victim % lines.len();
        let mut fields: Vec<String> = lines[victim].split(',').map(str::to_string).collect();
        fields[column] = format!(" {spelling}");
        lines[victim] = fields.join(",");

        prop_assert!(GpuParser::parse(&lines.join("\n"), FieldSet::Extended).is_err());
    }

    /// Floats round to the nearest integer
    #[test]
    fn prop_floats_round(whole in 0i64..1000, frac in 0u32..100) {
        prop_assume!(frac != 50);
        let row = format!("0, G, {whole}.{frac:02}, 50, 1, 2");
        let snapshot = GpuParser::parse(&row, FieldSet::Reduced).unwrap();
        let expected = if frac > 50 { whole + 1 } else { whole };
        prop_assert_eq!(snapshot.gpus()[0].utilization, expected);
    }

    /// Rows with fewer than six fields never produce a snapshot
    #[test]
    fn prop_short_rows_rejected(fields in 1usize..6) {
        let row = vec!["1"; fields].join(", ");
        prop_assert!(GpuParser::parse(&row, FieldSet::Extended).is_err());
    }
}
