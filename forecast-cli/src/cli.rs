use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, FetchError, FileConfig, RequestState, WeatherClient, WeatherSession,
    config::ApiKey,
};
use inquire::{Confirm, InquireError, Password, PasswordDisplayMode, Text};

use crate::{logging, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Current weather for any city")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store your OpenWeatherMap API key in the config file.
    Configure,

    /// Show current weather for a city.
    Show {
        /// City name; defaults to the configured default city.
        city: Option<String>,

        /// Print the normalized result as JSON instead of a card.
        #[arg(long)]
        json: bool,
    },

    /// Look up cities one after another, with a retry prompt on failure.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => {
                logging::init(false);
                configure()
            }
            Command::Show { city, json } => {
                let config = startup()?;
                let city = city.unwrap_or_else(|| config.app.default_city.clone());
                show(&config, &city, json).await
            }
            Command::Interactive => {
                let config = startup()?;
                interactive(&config).await
            }
        }
    }
}

/// Loads configuration; a bad configuration stops the program here.
fn startup() -> anyhow::Result<Config> {
    let config = Config::load().context("Invalid configuration")?;
    logging::init(config.features.enable_logging);
    tracing::debug!(version = config.app.version, base_url = %config.api.base_url, "configuration loaded");
    Ok(config)
}

fn session(config: &Config) -> WeatherSession<WeatherClient> {
    WeatherSession::new(WeatherClient::from_config(config), config.api.timeout)
}

fn configure() -> anyhow::Result<()> {
    let key = Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let key = ApiKey::parse(Some(key.as_str()))?;

    let mut file = FileConfig::load()?;
    file.set_api_key(key.expose().to_owned());
    let path = file.save()?;

    println!("API key saved to {}", path.display());
    Ok(())
}

async fn show(config: &Config, city: &str, json: bool) -> anyhow::Result<()> {
    let mut session = session(config);

    match session.submit(city).await? {
        RequestState::Success(weather) => {
            if json {
                println!("{}", serde_json::to_string_pretty(weather)?);
            } else {
                println!("{}\n", render::header(config.app.name, chrono::Local::now().time()));
                print!("{}", render::card(weather));
            }
            Ok(())
        }
        RequestState::Failed(err) => bail!(err.user_message()),
        state => bail!("lookup ended in unexpected state {state:?}"),
    }
}

async fn interactive(config: &Config) -> anyhow::Result<()> {
    let mut session = session(config);
    println!("{}", render::header(config.app.name, chrono::Local::now().time()));

    loop {
        let input = match Text::new("City:").with_default(&config.app.default_city).prompt() {
            Ok(input) => input,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e).context("Failed to read city"),
        };

        if let Err(e) = session.submit(&input).await {
            eprintln!("{e}");
            continue;
        }

        while let Some(err) = report(session.state()) {
            let answer = Confirm::new(&format!("{} Retry?", err.user_message()))
                .with_default(err.is_retryable())
                .prompt();
            let retry = retry_decision(answer)?;

            if !retry || session.retry().await.is_none() {
                break;
            }
        }
    }

    Ok(())
}

/// Cancelling the prompt means "no"; any other prompt failure is an error.
fn retry_decision(answer: Result<bool, InquireError>) -> anyhow::Result<bool> {
    match answer {
        Ok(retry) => Ok(retry),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
        Err(e) => Err(e).context("Failed to read retry answer"),
    }
}

/// Prints a successful lookup; hands back the error of a failed one.
fn report(state: &RequestState) -> Option<FetchError> {
    match state {
        RequestState::Success(weather) => {
            println!("{}", render::card(weather));
            None
        }
        RequestState::Failed(err) => Some(err.clone()),
        RequestState::Idle | RequestState::Loading => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn show_takes_optional_city_and_json_flag() {
        let cli = Cli::try_parse_from(["forecast", "show", "New York", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Show { city: Some(ref c), json: true } if c == "New York"
        ));

        let cli = Cli::try_parse_from(["forecast", "show"]).unwrap();
        assert!(matches!(cli.command, Command::Show { city: None, json: false }));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["forecast"]).is_err());
    }

    #[test]
    fn retry_prompt_outcomes() {
        assert!(retry_decision(Ok(true)).unwrap());
        assert!(!retry_decision(Ok(false)).unwrap());
        assert!(!retry_decision(Err(InquireError::OperationCanceled)).unwrap());
        assert!(!retry_decision(Err(InquireError::OperationInterrupted)).unwrap());

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "tty gone");
        let err = retry_decision(Err(InquireError::IO(io))).unwrap_err();
        assert!(err.to_string().contains("Failed to read retry answer"));
    }

    #[test]
    fn report_returns_failure_kind() {
        assert_eq!(
            report(&RequestState::Failed(FetchError::RateLimited)),
            Some(FetchError::RateLimited)
        );
        assert_eq!(report(&RequestState::Idle), None);
    }
}
