use std::fmt::Display;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::{FixedOffset, Local, TimeZone, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pass_predictor::config::{AppConfig, load_app_config, load_roster};
use pass_predictor::export::{self, Format};
use pass_predictor::importer::HttpCatalog;
use pass_predictor::model::SatelliteId;
use pass_predictor::predict::{
    CancelToken, PredictionError, PredictionRequest, PredictionService, RequestForm,
};
use pass_predictor::propagator::Sgp4Propagator;
use pass_predictor::store::TleStore;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Predict visible satellite passes")]
struct Cli {
    /// Application config (TOML); defaults apply when the file is absent
    #[arg(long, global = true, default_value = "configs/pass_predict.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict passes for roster satellites
    Predict(PredictArgs),
    /// Refresh stored element sets from the catalog
    Update {
        /// Designators to refresh (defaults to the whole roster)
        #[arg(long = "sat")]
        satellites: Vec<String>,
    },
    /// List roster designators and names
    Roster,
}

#[derive(Args)]
struct PredictArgs {
    /// Designators to predict (defaults to the whole roster)
    #[arg(long = "sat")]
    satellites: Vec<String>,

    /// Start date, dd/mm/yyyy or yyyy-mm-dd (defaults to today)
    #[arg(long)]
    date: Option<String>,

    /// Forecast horizon in days
    #[arg(long)]
    days: Option<u32>,

    /// Minimum culmination elevation in degrees
    #[arg(long, allow_negative_numbers = true)]
    min_elevation: Option<f64>,

    /// Earliest local hour of culmination
    #[arg(long)]
    min_hour: Option<u32>,

    /// Latest local hour of culmination
    #[arg(long)]
    max_hour: Option<u32>,

    /// Observer latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Observer longitude in degrees, east positive
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Observer altitude in metres
    #[arg(long, allow_negative_numbers = true)]
    alt: Option<f64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Output path, `-` for stdout
    #[arg(long, default_value = "-")]
    output: PathBuf,
}

#[derive(Copy, Clone, ValueEnum, Debug)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Format::Text,
            OutputFormat::Csv => Format::Csv,
            OutputFormat::Json => Format::Json,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = read_config(&cli.config)?;

    match cli.command {
        Command::Predict(args) => match config.utc_offset_seconds()? {
            Some(seconds) => {
                let zone = FixedOffset::east_opt(seconds)
                    .with_context(|| format!("utc_offset {seconds}s is out of range"))?;
                predict(&config, &args, zone)
            }
            None => predict(&config, &args, Local),
        },
        Command::Update { satellites } => update(&config, &satellites),
        Command::Roster => roster(&config),
    }
}

fn read_config(path: &Path) -> anyhow::Result<AppConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config file absent, using defaults");
        return Ok(AppConfig::default());
    }
    load_app_config(path).with_context(|| format!("loading {}", path.display()))
}

fn predict<Tz>(config: &AppConfig, args: &PredictArgs, zone: Tz) -> anyhow::Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let roster = load_roster(&config.roster)
        .with_context(|| format!("loading roster {}", config.roster.display()))?;
    let satellites = if args.satellites.is_empty() {
        roster
            .ids()
            .map(SatelliteId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    } else {
        args.satellites.join(",")
    };
    let defaults = &config.defaults;
    let observer = &config.observer;
    let today = Utc::now().with_timezone(&zone).date_naive();
    let form = RequestForm {
        satellites,
        start_date: args
            .date
            .clone()
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
        horizon_days: args.days.unwrap_or(defaults.horizon_days).to_string(),
        min_elevation_deg: args
            .min_elevation
            .unwrap_or(defaults.min_elevation_deg)
            .to_string(),
        min_hour: args.min_hour.unwrap_or(defaults.min_hour).to_string(),
        max_hour: args.max_hour.unwrap_or(defaults.max_hour).to_string(),
        latitude: args.lat.unwrap_or(observer.latitude).to_string(),
        longitude: args.lon.unwrap_or(observer.longitude).to_string(),
        altitude_m: args.alt.unwrap_or(observer.altitude_m).to_string(),
    };
    let request = PredictionRequest::try_from(&form)?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        info!("interrupt received, cancelling");
        handler_token.cancel();
    })
    .context("installing interrupt handler")?;

    let service = PredictionService::new(
        roster,
        TleStore::new(&config.tle_dir),
        Sgp4Propagator::default(),
        zone,
    );
    let result = service.predict(&request, &cancel)?;

    let mut writer = export::writer_for_path(&args.output)
        .with_context(|| format!("opening {}", args.output.display()))?;
    export::write_result(&mut writer, &result, args.format.into())?;
    writer.flush()?;
    Ok(())
}

fn update(config: &AppConfig, satellites: &[String]) -> anyhow::Result<()> {
    let roster = load_roster(&config.roster)
        .with_context(|| format!("loading roster {}", config.roster.display()))?;
    let ids: Vec<SatelliteId> = if satellites.is_empty() {
        roster.ids().cloned().collect()
    } else {
        satellites
            .iter()
            .map(|raw| SatelliteId::new(raw.as_str()))
            .collect::<Result<Vec<_>, _>>()?
    };
    if let Some(unknown) = ids.iter().find(|id| !roster.contains(id)) {
        return Err(PredictionError::UnknownSatellite(unknown.clone()).into());
    }
    let catalog = HttpCatalog::new(
        &config.catalog.base_url,
        &config.catalog.query_param,
        Duration::from_secs(config.catalog.timeout_secs),
    )?;
    let store = TleStore::new(&config.tle_dir);

    let report = store.update_all(&catalog, &ids);
    for (id, outcome) in &report.outcomes {
        match outcome {
            Ok(()) => println!("{id}: updated"),
            Err(err) => println!("{id}: FAILED ({err})"),
        }
    }
    let refreshed = report.into_result()?;
    info!(refreshed = refreshed.len(), "update complete");
    Ok(())
}

fn roster(config: &AppConfig) -> anyhow::Result<()> {
    let roster = load_roster(&config.roster)
        .with_context(|| format!("loading roster {}", config.roster.display()))?;
    let stored = TleStore::new(&config.tle_dir).list()?;
    let width = roster.ids().map(|id| id.as_str().len()).max().unwrap_or(0);
    for (id, name) in roster.iter() {
        let marker = if stored.contains(id) { "" } else { "  (no TLE)" };
        println!("{:<width$}  {name}{marker}", id.as_str());
    }
    Ok(())
}
