use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use trender::config::{Config, API_KEY_ENV};
use trender::render::{
    format_render_error, DeployOptions, ListServicesParams, LogLevel, LogQuery, RenderClient,
    ServiceType,
};

/// Command-line client for the Render platform API
#[derive(Parser, Debug)]
#[command(name = "trender", version, about, long_about = None)]
struct Args {
    /// Render API key (falls back to RENDER_API_KEY, then the config file)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// API base URL (falls back to RENDER_API_URL, then the config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevelArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List one page of services
    Services {
        #[arg(long)]
        limit: Option<u32>,
        /// Service type, e.g. web_service, cron_job
        #[arg(long = "type")]
        service_type: Option<ServiceType>,
        #[arg(long)]
        name: Option<String>,
        /// Cursor from a previous page
        #[arg(long)]
        cursor: Option<String>,
    },
    /// Show a single service
    Service { id: String },
    /// Trigger a deploy
    Deploy {
        /// Service id (defaults to the configured service)
        id: Option<String>,
        /// Clear the build cache first
        #[arg(long)]
        clear_cache: bool,
    },
    /// Read logs for one service or the whole account
    Logs {
        /// Service id; omit for account-wide logs
        #[arg(long)]
        service: Option<String>,
        /// Read the whole account even if a default service is configured
        #[arg(long, conflicts_with = "service")]
        all: bool,
        /// Relative start, e.g. 30m, 2h, 1d
        #[arg(long, conflicts_with = "start")]
        since: Option<String>,
        /// ISO-8601 start time
        #[arg(long)]
        start: Option<String>,
        /// ISO-8601 end time
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        level: Option<LogLevel>,
        /// Number of time windows to walk
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Check that the API is reachable with the configured key
    Ping,
    /// Persist settings to the config file
    Config {
        /// API key to store
        #[arg(long)]
        key: Option<String>,
        /// Base URL to store
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        default_service: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevelArg::Off => None,
            LogLevelArg::Error => Some(Level::ERROR),
            LogLevelArg::Warn => Some(Level::WARN),
            LogLevelArg::Info => Some(Level::INFO),
            LogLevelArg::Debug => Some(Level::DEBUG),
            LogLevelArg::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevelArg) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Cannot open log file {:?}: {}", log_path, err);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("trender started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("trender").join("trender.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".trender").join("trender.log");
    }
    PathBuf::from("trender.log")
}

/// Parse a relative span like `45s`, `30m`, `2h`, `1d`
fn parse_since(span: &str) -> Result<TimeDelta> {
    let span = span.trim();
    let Some(unit) = span.chars().last() else {
        bail!("empty duration");
    };
    let amount: i64 = span[..span.len() - unit.len_utf8()]
        .parse()
        .with_context(|| format!("invalid duration '{}'", span))?;
    if amount < 0 {
        bail!("duration '{}' must not be negative", span);
    }

    let delta = match unit {
        's' => TimeDelta::try_seconds(amount),
        'm' => TimeDelta::try_minutes(amount),
        'h' => TimeDelta::try_hours(amount),
        'd' => TimeDelta::try_days(amount),
        _ => bail!("invalid duration unit in '{}' (use s, m, h or d)", span),
    };
    match delta {
        Some(delta) => Ok(delta),
        None => bail!("duration '{}' is too large", span),
    }
}

/// Start of a window reaching `span` back from `now`
fn since_start(now: DateTime<Utc>, span: &str) -> Result<String> {
    match now.checked_sub_signed(parse_since(span)?) {
        Some(start) => Ok(iso(start)),
        None => bail!("duration '{}' reaches before the supported date range", span),
    }
}

fn iso(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();

    if let Command::Config {
        key,
        url,
        default_service,
    } = &args.command
    {
        if let Some(key) = key {
            config.api_key = Some(key.clone());
        }
        if let Some(url) = url {
            config.base_url = Some(url.clone());
        }
        if let Some(service) = default_service {
            config.default_service = Some(service.clone());
        }
        config.save()?;
        if let Some(path) = Config::config_path() {
            println!("Saved {}", path.display());
        }
        return Ok(());
    }

    let Some(api_key) = config.effective_api_key(args.api_key.as_deref()) else {
        bail!(
            "No Render API key configured. Set {} or use --api-key",
            API_KEY_ENV
        );
    };
    let base_url = config.effective_base_url(args.base_url.as_deref());
    tracing::info!("Using API at {}", base_url);

    let client = RenderClient::with_base_url(&api_key, &base_url)
        .map_err(|e| anyhow::anyhow!(format_render_error(&e)))?;

    // Returning instead of exiting lets the log guard flush on the way out
    run(&client, &config, args.command).await
}

async fn run(client: &RenderClient, config: &Config, command: Command) -> Result<()> {
    let api_err = |e: trender::render::RenderError| anyhow::anyhow!(format_render_error(&e));

    match command {
        Command::Services {
            limit,
            service_type,
            name,
            cursor,
        } => {
            let params = ListServicesParams {
                limit,
                cursor,
                service_type,
                name,
                extra: Vec::new(),
            };
            let page = client.list_services(&params).await.map_err(api_err)?;
            print_json(&page)?;
        }
        Command::Service { id } => {
            let service = client.get_service(&id).await.map_err(api_err)?;
            print_json(&service)?;
        }
        Command::Deploy { id, clear_cache } => {
            let Some(id) = id.or_else(|| config.default_service.clone()) else {
                bail!("No service given and no default service configured");
            };
            let deployment = client
                .deploy_service(&id, &DeployOptions { clear_cache })
                .await
                .map_err(api_err)?;
            print_json(&deployment)?;
        }
        Command::Logs {
            service,
            all,
            since,
            start,
            end,
            limit,
            level,
            pages,
        } => {
            let service_id = if all {
                None
            } else {
                service.or_else(|| config.default_service.clone())
            };
            let start_time = match since {
                Some(span) => Some(since_start(Utc::now(), &span)?),
                None => start,
            };

            let mut query = LogQuery {
                service_id,
                start_time,
                end_time: end,
                limit,
                level,
            };

            for _ in 0..pages.max(1) {
                let page = client.get_logs(&query).await;
                for entry in &page.logs {
                    println!(
                        "{} {:<7} [{}] {}",
                        entry.timestamp.as_deref().unwrap_or("-"),
                        entry.level.as_ref().map(|l| l.as_str()).unwrap_or("-"),
                        entry.instance_id.as_deref().unwrap_or("-"),
                        entry.message.as_deref().unwrap_or("")
                    );
                }
                match page.next_query(&query) {
                    Some(next) => query = next,
                    None => break,
                }
            }
        }
        Command::Ping => {
            if client.test_connection().await {
                println!("OK {}", client.base_url());
            } else {
                bail!("Cannot reach {} with the configured key", client.base_url());
            }
        }
        Command::Config { .. } => unreachable!("handled before the client is built"),
    }

    Ok(())
}
