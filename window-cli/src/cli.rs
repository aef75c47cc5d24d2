use anyhow::{Context, anyhow, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{CustomType, Text};
use tokio::sync::mpsc;
use window_core::{
    Config, DeviceLink, DeviceView, Panel, RegionSearch, ServerError, WeatherLookup, WindowAction,
    display, services_from_config,
    state::{NOT_FOUND_MESSAGE, UNAVAILABLE_MESSAGE},
};

use crate::{input, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "window", version, about = "Window actuator control panel")]
pub struct Cli {
    /// Weather/region backend base URL; overrides config and WINDOW_SERVER_BASE.
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// ESP32 base URL; overrides config and WINDOW_DEVICE_BASE.
    #[arg(long, global = true)]
    pub device: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively edit and save the configuration file.
    Configure,

    /// Show weather and air quality for a location.
    Weather {
        /// Location name; defaults to the configured default location.
        location: Option<String>,
    },

    /// List region names matching a query.
    Regions {
        query: String,
    },

    /// Send a command to the window: open, close or stop.
    #[command(name = "command")]
    Dispatch {
        action: String,
    },

    /// Poll the window status once.
    Status,

    /// Run the interactive control panel.
    Panel,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let Cli {
            server,
            device,
            command,
        } = self;

        // Only `configure` works without a resolved config.
        let resolved = || -> anyhow::Result<Config> {
            let config = resolve_config(server.clone(), device.clone())?;
            config.log_config();
            Ok(config)
        };

        match command {
            Command::Configure => configure(),
            Command::Weather { location } => show_weather(&resolved()?, location).await,
            Command::Regions { query } => list_regions(&resolved()?, &query).await,
            Command::Dispatch { action } => dispatch(&resolved()?, &action).await,
            Command::Status => show_status(&resolved()?).await,
            Command::Panel => run_panel(&resolved()?).await,
        }
    }
}

/// File config, then environment, then command-line flags.
fn resolve_config(server: Option<String>, device: Option<String>) -> anyhow::Result<Config> {
    let mut config = Config::load()?.with_env_overrides();

    if server.is_some() {
        config.server_base = server;
    }
    if device.is_some() {
        config.device_base = device;
    }

    Ok(config)
}

async fn show_weather(config: &Config, location: Option<String>) -> anyhow::Result<()> {
    let services = services_from_config(config)?;
    let target = location.unwrap_or_else(|| config.default_location().to_string());

    let snapshot = services
        .weather
        .fetch_weather(&target)
        .await
        .map_err(|e| match e {
            ServerError::LocationNotFound => anyhow!(NOT_FOUND_MESSAGE),
            ServerError::ServiceUnavailable(detail) => {
                anyhow!("{UNAVAILABLE_MESSAGE} ({detail})")
            }
        })?;

    print!("{}", render::weather_card(&snapshot));
    Ok(())
}

async fn list_regions(config: &Config, query: &str) -> anyhow::Result<()> {
    let services = services_from_config(config)?;
    let regions = services.regions.search_regions(query).await?;

    if regions.is_empty() {
        println!("No regions match '{}'.", query.trim());
    }
    for region in regions {
        println!("{}\t{}", region.region_id, region.name);
    }

    Ok(())
}

async fn dispatch(config: &Config, action: &str) -> anyhow::Result<()> {
    let action = WindowAction::try_from(action)?;
    let services = services_from_config(config)?;

    println!("{} 명령 전송 중...", action.label());
    let reply = services
        .device
        .send_command(action)
        .await
        .with_context(|| format!("{} 실패", action.label()))?;

    let message = reply.message.unwrap_or_else(|| "응답 수신".to_string());
    println!("{} 성공: {message}", action.label());

    Ok(())
}

async fn show_status(config: &Config) -> anyhow::Result<()> {
    let services = services_from_config(config)?;
    let status = services
        .device
        .fetch_status()
        .await
        .context("ESP32 상태 조회 실패")?;

    let view = DeviceView::Connected(status);
    println!("{}", display::status_line(&view));
    if let Some(notice) = display::rain_notice(&view) {
        println!("{notice}");
    }

    Ok(())
}

async fn run_panel(config: &Config) -> anyhow::Result<()> {
    let services = services_from_config(config)?;
    let (tx, rx) = mpsc::channel(32);

    println!("{}", input::HELP);
    // The reader thread is left detached; it ends on EOF or /quit.
    let _reader = input::spawn_reader(tx);

    let panel = Panel::from_config(config, services);
    let state = panel
        .run(rx, |view| {
            let clock = display::clock_label(&Local::now());
            print!("{}", render::panel(view, &clock));
        })
        .await;

    tracing::debug!(log_entries = state.log.len(), "panel closed");
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let server_default = config.server_base().to_string();
    let device_default = config.device_base().to_string();
    let location_default = config.default_location().to_string();

    let server = Text::new("Weather server base URL:")
        .with_default(&server_default)
        .prompt()?;
    let device = Text::new("ESP32 base URL:")
        .with_default(&device_default)
        .prompt()?;
    let location = Text::new("Default location:")
        .with_default(&location_default)
        .prompt()?;
    let status_poll_secs = CustomType::<u64>::new("Status poll interval (seconds):")
        .with_default(config.polling.status_poll_secs)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()?;

    if location.trim().is_empty() {
        bail!("Default location must not be empty.");
    }

    config.server_base = Some(server.trim().to_string());
    config.device_base = Some(device.trim().to_string());
    config.default_location = Some(location.trim().to_string());
    config.polling.status_poll_secs = status_poll_secs;

    // Reject unusable URLs before they reach the file.
    services_from_config(&config).context("Configuration was not saved")?;

    config.save()?;
    println!(
        "Saved configuration to {}",
        Config::config_file_path()?.display()
    );

    Ok(())
}
