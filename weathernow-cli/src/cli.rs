use anyhow::Context;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, CustomType, Select, Text};
use std::{process::ExitCode, sync::Arc};
use weathernow_core::{
    Config, Coordinates, FixedPosition, OpenMeteoProvider, PositionSource, SearchController,
    SearchState,
};

use crate::render::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weathernow", version, about = "Current weather by city or position")]
pub struct Cli {
    /// Log request details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current weather for a city.
    Search {
        /// City name; several words are joined with spaces.
        #[arg(required = true)]
        city: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show current weather at your position (from flags or configuration).
    Here {
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Set the default position and lookup language.
    Configure,

    /// Search repeatedly from a prompt.
    Interactive,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Print the final search state as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Search { city, output } => {
                let config = Config::load()?;
                let controller = build_controller(&config, None);

                controller.set_query(city.join(" "));
                controller.submit().await;

                report(&controller.snapshot(), &output)
            }
            Command::Here { lat, lon, output } => {
                let config = Config::load()?;
                let flags = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                let controller = build_controller(&config, flags);

                controller.search_by_current_location().await;

                report(&controller.snapshot(), &output)
            }
            Command::Configure => {
                configure()?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Interactive => {
                let config = Config::load()?;
                interactive(build_controller(&config, None)).await?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Position flags win over the configured position; with neither, positioning is unsupported.
fn build_controller(config: &Config, position_override: Option<Coordinates>) -> SearchController {
    let provider = Arc::new(OpenMeteoProvider::new(config.api.clone()));
    let position = position_override
        .or(config.position)
        .map(|coords| Arc::new(FixedPosition::new(coords)) as Arc<dyn PositionSource>);

    tracing::debug!(
        geocoding = %config.api.geocoding_url,
        forecast = %config.api.forecast_url,
        has_position = position.is_some(),
        "building search controller"
    );

    SearchController::new(provider, position)
}

fn report(state: &SearchState, output: &OutputArgs) -> anyhow::Result<ExitCode> {
    if output.json {
        let json =
            serde_json::to_string_pretty(state).context("Failed to serialize search state")?;
        println!("{json}");
    } else {
        println!("{}", render(state, Local::now().date_naive()));
    }

    Ok(if state.error.is_some() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let current = config
        .position
        .map(|coords| coords.to_string())
        .unwrap_or_else(|| "not set".to_string());
    println!("Current default position: {current}");

    let set_position = Confirm::new("Set a default position for `weathernow here`?")
        .with_default(config.position.is_none())
        .prompt()
        .context("Failed to read answer")?;

    if set_position {
        let latitude = CustomType::<f64>::new("Latitude (-90..90):")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude (-180..180):")
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read longitude")?;

        config.set_position(Coordinates::new(latitude, longitude))?;
    } else if config.position.is_some()
        && Confirm::new("Remove the saved position?")
            .with_default(false)
            .prompt()
            .context("Failed to read answer")?
    {
        config.clear_position();
    }

    let language = Text::new("Geocoding language:")
        .with_default(&config.api.language)
        .prompt()
        .context("Failed to read language")?;
    config.set_language(&language)?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

const SEARCH_CITY: &str = "Search by city";
const USE_POSITION: &str = "Use current location";
const QUIT: &str = "Quit";

async fn interactive(controller: SearchController) -> anyhow::Result<()> {
    println!("{}", render(&controller.snapshot(), Local::now().date_naive()));

    loop {
        let choice = Select::new("What next?", vec![SEARCH_CITY, USE_POSITION, QUIT])
            .prompt()
            .context("Failed to read choice")?;

        match choice {
            SEARCH_CITY => {
                let city = Text::new("City:")
                    .with_initial_value(&controller.snapshot().query)
                    .prompt()
                    .context("Failed to read city")?;
                controller.set_query(city);
                controller.submit().await;
            }
            USE_POSITION => controller.search_by_current_location().await,
            _ => break,
        }

        println!("{}", render(&controller.snapshot(), Local::now().date_naive()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured_at(coords: Coordinates) -> Config {
        let mut config = Config::default();
        config.set_position(coords).expect("valid configured position");
        config
    }

    #[tokio::test]
    async fn here_without_any_position_is_unsupported() {
        let controller = build_controller(&Config::default(), None);

        controller.search_by_current_location().await;

        let state = controller.snapshot();
        assert_eq!(
            state.error.as_deref(),
            Some("Geolocation is not supported by this browser")
        );
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn position_flags_take_precedence_over_config() {
        let config = configured_at(Coordinates::new(52.52, 13.41));
        let controller = build_controller(&config, Some(Coordinates::new(95.0, 13.41)));

        controller.search_by_current_location().await;

        let state = controller.snapshot();
        assert_eq!(state.error.as_deref(), Some("Unable to access your location"));
        assert!(!state.is_loading);
        assert!(state.view.is_none());
    }

    #[tokio::test]
    async fn invalid_configured_position_is_used_without_flags() {
        let config = Config {
            position: Some(Coordinates::new(-91.0, 0.0)),
            ..Config::default()
        };
        let controller = build_controller(&config, None);

        controller.search_by_current_location().await;

        assert_eq!(
            controller.snapshot().error.as_deref(),
            Some("Unable to access your location")
        );
    }

    #[test]
    fn report_exit_code_follows_error() {
        let output = OutputArgs { json: true };

        let ok = SearchState::default();
        assert_eq!(report(&ok, &output).expect("report"), ExitCode::SUCCESS);

        let failed = SearchState {
            error: Some("City not found".into()),
            ..SearchState::default()
        };
        assert_eq!(report(&failed, &output).expect("report"), ExitCode::FAILURE);

        let text = OutputArgs { json: false };
        assert_eq!(report(&failed, &text).expect("report"), ExitCode::FAILURE);
    }
}
