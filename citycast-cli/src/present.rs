//! Human-readable rendering of a forecast: four metadata lines, then one
//! table row per hour.

use chrono::{DateTime, Utc};
use citycast_core::{ForecastResponse, HourlyVariable};
use std::io::{self, Write};

const DATE_HEADER: &str = "date";

pub fn write_report(out: &mut impl Write, forecast: &ForecastResponse) -> io::Result<()> {
    write_metadata(out, forecast)?;
    write_table(out, forecast)
}

fn write_metadata(out: &mut impl Write, forecast: &ForecastResponse) -> io::Result<()> {
    writeln!(out, "Coordinates {:?}°N {:?}°E", forecast.latitude, forecast.longitude)?;
    writeln!(out, "Elevation {:?} m asl", forecast.elevation)?;
    writeln!(out, "Timezone {} {}", forecast.timezone, forecast.timezone_abbreviation)?;
    writeln!(out, "Timezone difference to GMT+0 {} s", forecast.utc_offset_seconds)
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "NaN".to_string(),
    }
}

fn write_table(out: &mut impl Write, forecast: &ForecastResponse) -> io::Result<()> {
    let points = forecast.hourly.points();
    let value_header = HourlyVariable::Temperature2m.as_str();

    let rows: Vec<(String, String)> = points
        .iter()
        .map(|p| (format_time(p.time), format_value(p.temperature_2m)))
        .collect();

    let index_width = points.len().saturating_sub(1).to_string().len();
    let date_width = rows.iter().map(|(d, _)| d.len()).max().unwrap_or(0).max(DATE_HEADER.len());
    let value_width = rows.iter().map(|(_, v)| v.len()).max().unwrap_or(0).max(value_header.len());

    writeln!(
        out,
        "{:index_width$}  {:>date_width$}  {:>value_width$}",
        "", DATE_HEADER, value_header
    )?;

    for (i, (date, value)) in rows.iter().enumerate() {
        writeln!(out, "{i:<index_width$}  {date:>date_width$}  {value:>value_width$}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use citycast_core::{HourlySeries, half_open_range};

    fn forecast(values: Vec<Option<f64>>) -> ForecastResponse {
        let end = 1_700_000_000 + 3600 * values.len() as i64;
        let times = half_open_range(1_700_000_000, end, 3600).unwrap();

        ForecastResponse {
            latitude: 48.86,
            longitude: 2.3399997,
            elevation: 43.0,
            timezone: "GMT".into(),
            timezone_abbreviation: "GMT".into(),
            utc_offset_seconds: 0,
            hourly_start: 1_700_000_000,
            hourly_end: end,
            hourly_interval: 3600,
            hourly: HourlySeries::new(times, values).unwrap(),
        }
    }

    fn render(f: &ForecastResponse) -> String {
        let mut buf = Vec::new();
        write_report(&mut buf, f).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn metadata_lines_come_first() {
        let text = render(&forecast(vec![Some(9.1)]));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Coordinates 48.86°N 2.3399997°E");
        assert_eq!(lines[1], "Elevation 43.0 m asl");
        assert_eq!(lines[2], "Timezone GMT GMT");
        assert_eq!(lines[3], "Timezone difference to GMT+0 0 s");
    }

    #[test]
    fn one_row_per_hour_with_named_columns() {
        let text = render(&forecast(vec![Some(9.1), Some(8.75), None]));
        let lines: Vec<&str> = text.lines().skip(4).collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("date"));
        assert!(lines[0].ends_with("temperature_2m"));
        assert_eq!(lines[1], "0  2023-11-14 22:13:20+00:00             9.1");
        assert!(lines[2].starts_with("1  2023-11-14 23:13:20+00:00"));
        assert!(lines[3].ends_with("NaN"));
    }

    #[test]
    fn index_column_widens_past_ten_rows() {
        let text = render(&forecast(vec![Some(1.0); 12]));
        let last = text.lines().last().unwrap();

        assert!(last.starts_with("11  "));
        assert!(text.lines().nth(5).unwrap().starts_with("0   "));
    }

    #[test]
    fn empty_series_prints_header_only() {
        let text = render(&forecast(Vec::new()));
        assert_eq!(text.lines().count(), 5);
    }
}
