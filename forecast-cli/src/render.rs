use std::fmt;

use forecast_core::{Dashboard, DaySummary, LocalInstant, Location, Sample};

/// Plain-text rendering of a [`Dashboard`].
pub struct DashboardView<'a>(pub &'a Dashboard);

impl fmt::Display for DashboardView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dashboard = self.0;
        let location = &dashboard.location;
        let current = &dashboard.current;

        writeln!(f, "{}", location.display_name())?;
        writeln!(
            f,
            "{}",
            current.local_instant(location).format("%A, %-d %B")
        )?;
        writeln!(f)?;

        write_current(f, current)?;
        writeln!(f)?;

        if !dashboard.today.is_empty() {
            writeln!(f, "Today")?;
            for sample in &dashboard.today {
                write_slot(f, sample, location)?;
            }
            writeln!(f)?;
        }

        write_details(f, current, location)?;

        if !dashboard.outlook.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}-day forecast", dashboard.outlook.len())?;
            for day in &dashboard.outlook {
                write_day(f, day)?;
            }
        }

        Ok(())
    }
}

fn write_current(f: &mut fmt::Formatter<'_>, current: &Sample) -> fmt::Result {
    writeln!(
        f,
        "  {} °C  {}",
        degrees(current.temp_c),
        capitalize(&current.condition.description)
    )?;
    writeln!(f, "  Feels like {} °C", degrees(current.feels_like_c))?;
    writeln!(
        f,
        "  Min: {} °C  Max: {} °C",
        degrees(current.temp_min_c),
        degrees(current.temp_max_c)
    )
}

fn write_slot(f: &mut fmt::Formatter<'_>, sample: &Sample, location: &Location) -> fmt::Result {
    writeln!(
        f,
        "  {:>8}  {:>4} °C  {}",
        clock(&sample.local_instant(location)),
        degrees(sample.temp_c),
        sample.condition.icon
    )
}

fn write_details(f: &mut fmt::Formatter<'_>, current: &Sample, location: &Location) -> fmt::Result {
    writeln!(f, "  Visibility    {}", meters_to_kilometers(current.visibility_m))?;
    writeln!(f, "  Humidity      {} %", current.humidity_pct)?;
    writeln!(f, "  Wind speed    {:.1} m/s", current.wind_speed_mps)?;
    writeln!(f, "  Air pressure  {} hPa", degrees(current.pressure_hpa))?;
    writeln!(f, "  Sunrise       {}", optional_clock(location.sunrise_local()))?;
    writeln!(f, "  Sunset        {}", optional_clock(location.sunset_local()))
}

fn write_day(f: &mut fmt::Formatter<'_>, day: &DaySummary) -> fmt::Result {
    writeln!(
        f,
        "  {:<10} {:<10} {:>4} {:<24} {:>4} / {:>4} °C",
        day.date.format("%A").to_string(),
        day.date.format("%-d %B").to_string(),
        day.condition.icon,
        capitalize(&day.condition.description),
        degrees(day.min_c),
        degrees(day.max_c)
    )
}

/// Whole degrees, without a "-0".
fn degrees(value: f64) -> String {
    let rounded = value.round();
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{rounded:.0}")
    }
}

fn meters_to_kilometers(meters: u32) -> String {
    format!("{:.0} km", f64::from(meters) / 1000.0)
}

fn clock(instant: &LocalInstant) -> String {
    instant.format("%-I:%M %p").to_string()
}

fn optional_clock(instant: Option<LocalInstant>) -> String {
    instant.as_ref().map(clock).unwrap_or_else(|| "-".to_string())
}

fn capitalize(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
