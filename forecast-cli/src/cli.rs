use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, CurrentPolicy, Dashboard, ForecastQuery, provider_from_config,
};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};

use crate::render::DashboardView;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Weather forecast dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and a default location.
    Configure,

    /// Show current conditions and the multi-day outlook for a location.
    Show {
        /// Free-text location, e.g. "Melbourne,AU"; defaults to the configured one.
        location: Option<String>,

        /// Evaluate as of this RFC 3339 instant instead of the system clock.
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,

        /// Use the sample nearest to now as current weather instead of the first one.
        #[arg(long)]
        nearest: bool,

        /// Print the dashboard as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactively search locations until an empty entry.
    Search,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                location,
                now,
                nearest,
                json,
            } => {
                let config = Config::load()?;
                let place = config.resolve_location(location)?;
                let policy = if nearest {
                    CurrentPolicy::Nearest
                } else {
                    config.current_policy
                };
                let query = ForecastQuery::new(provider_from_config(&config)?, config.cache_ttl());

                show(&query, &place, now.unwrap_or_else(Utc::now), policy, json).await
            }
            Command::Search => search().await,
        }
    }
}

fn parse_now(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| format!("expected an RFC 3339 timestamp: {err}"))
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key.trim().to_string());

    let mut location = Text::new("Default location (optional):")
        .with_placeholder("Melbourne,AU");
    if let Some(current) = config.default_location.as_deref() {
        location = location.with_default(current);
    }
    let location = location.prompt().context("Failed to read default location")?;
    config.set_default_location(location);

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

async fn show(
    query: &ForecastQuery,
    place: &str,
    now: DateTime<Utc>,
    policy: CurrentPolicy,
    json: bool,
) -> Result<()> {
    tracing::info!(place, %now, ?policy, "showing forecast");

    let series = query.fetch(place).await?;
    let dashboard = Dashboard::build(&series, now, policy)?;

    if json {
        let out = serde_json::to_string_pretty(&dashboard)
            .context("Failed to serialize dashboard to JSON")?;
        println!("{out}");
    } else {
        print!("{}", DashboardView(&dashboard));
    }
    Ok(())
}

async fn search() -> Result<()> {
    let config = Config::load()?;
    let query = ForecastQuery::new(provider_from_config(&config)?, config.cache_ttl());

    loop {
        let previous = query.current_place();
        let mut prompt = Text::new("Search location:").with_help_message("empty to quit");
        if let Some(previous) = previous.as_deref() {
            prompt = prompt.with_placeholder(previous);
        }

        let place = match prompt.prompt() {
            Ok(place) => place,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err).context("Failed to read location"),
        };
        let place = place.trim();
        if place.is_empty() {
            break;
        }

        eprintln!("Loading...");
        // Searches run one at a time, so a result is never superseded here.
        // A failed query is reported once; the next search starts fresh.
        if let Err(err) = show(&query, place, Utc::now(), config.current_policy, false).await {
            eprintln!("Error: {err:#}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_now_accepts_rfc3339() {
        let now = parse_now("2024-03-01T23:00:00+11:00").expect("parses");
        assert_eq!(now.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }

    #[test]
    fn parse_now_rejects_other_forms() {
        assert!(parse_now("2024-03-01 12:00").is_err());
    }

    #[test]
    fn show_args_parse() {
        let cli = Cli::try_parse_from(["forecast", "show", "Melbourne,AU", "--nearest", "--json"])
            .expect("parses");

        match cli.command {
            Command::Show {
                location,
                now,
                nearest,
                json,
            } => {
                assert_eq!(location.as_deref(), Some("Melbourne,AU"));
                assert!(now.is_none());
                assert!(nearest);
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
