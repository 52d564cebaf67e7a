use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sprint_tracker::analytics::{
    axis_label, calculate_y_axis_domain, chart_buckets, compute_metrics, filter_sprints,
    max_bucket_seconds, TimePeriod,
};
use sprint_tracker::api::{build_router, cors_layer, state::AppState};
use sprint_tracker::auth::SESSION_COOKIE;
use sprint_tracker::config::AppConfig;
use sprint_tracker::email::mailer_from_config;
use sprint_tracker::events::EventBus;
use sprint_tracker::models::{Project, UserId};
use sprint_tracker::storage::{StorageConfig, Store};
use sprint_tracker::timer::{parse_target, TimerMode, TimerSession, TimerState};

#[derive(Parser)]
#[command(name = "sprint-tracker")]
#[command(about = "Track focused work sprints against projects")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a timer in the terminal and record the sprint
    Track {
        /// Account email the sprint belongs to
        #[arg(long)]
        email: String,

        /// Project name (created if it doesn't exist)
        #[arg(long)]
        project: String,

        /// Timer mode: stopwatch, 15m, 30m, 1h, 2h, or custom
        #[arg(long, default_value = "stopwatch")]
        mode: String,

        /// Countdown target for custom mode (e.g. "1h 30m", "45m", "90")
        #[arg(long)]
        target: Option<String>,

        /// Notes to attach to the sprint
        #[arg(long)]
        notes: Option<String>,
    },

    /// Print period statistics for an account
    Stats {
        /// Account email
        #[arg(long)]
        email: String,

        /// Period: today, this-week, last-week, this-month, last-month, this-year
        #[arg(long, default_value = "today")]
        period: String,

        /// Narrow to one project by name
        #[arg(long)]
        project: Option<String>,

        /// Local offset in minutes east of UTC
        #[arg(long, default_value = "0")]
        tz_offset: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        AppConfig::from_file(&cli.config)?
    } else {
        AppConfig::default()
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone();
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting sprint-tracker v{}", env!("CARGO_PKG_VERSION"));

    let bus = Arc::new(EventBus::default());
    let storage = StorageConfig::new(config.data_dir.clone());
    let store = Arc::new(Store::open(storage, bus.clone())?);

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            // Log every persisted mutation off the change bus
            let mut events = bus.subscribe();
            tokio::spawn(async move {
                while let Ok(event) = events.recv().await {
                    tracing::info!(
                        entity = event.entity.as_str(),
                        action = event.action.as_str(),
                        id = event.entity_id.as_str(),
                        user = event.user_id.as_str(),
                        "change"
                    );
                }
            });

            let state = AppState {
                store,
                mailer: Arc::from(mailer_from_config(&config.email)),
                auth: Arc::new(config.auth.clone()),
            };
            let app = build_router(state).layer(cors_layer(&config.server.cors_origin));
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{} (session cookie: {})", addr, SESSION_COOKIE);
            axum::serve(listener, app).await?;
        }

        Commands::Track {
            email,
            project,
            mode,
            target,
            notes,
        } => {
            let user = store
                .upsert_user_by_email(&email)
                .context("Failed to resolve account")?;
            let project = resolve_project(&store, &user.id, &project)?;

            let mode = parse_mode(&mode)?;
            let mut session = TimerSession::new(mode);
            if mode == TimerMode::Custom {
                let input = target
                    .as_deref()
                    .ok_or_else(|| anyhow!("Custom mode needs --target"))?;
                let seconds = parse_target(input)
                    .ok_or_else(|| anyhow!("Unparseable target: {}", input))?;
                session.timer_mut().set_custom_target(seconds)?;
            }
            session.select_project(Some(project.id.clone()));
            if let Some(notes) = notes {
                session.set_notes(notes);
            }

            println!("Tracking '{}' ({}). Ctrl-C to finish.", project.name, describe(mode));
            session.start(Utc::now())?;

            let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
            let draft = loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let tick = session.tick(Utc::now());
                        print!("\r  {}  ", tick.display);
                        std::io::stdout().flush().ok();
                        if let Some(draft) = tick.draft {
                            println!();
                            break Some(draft);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        println!();
                        break session.complete(Utc::now())?;
                    }
                }
            };

            match draft {
                Some(draft) => {
                    let sprint = store.add_sprint(&user.id, draft)?;
                    println!(
                        "Recorded {} on '{}'",
                        sprint_tracker::analytics::format_duration(sprint.duration_seconds as u64),
                        project.name
                    );
                }
                None => println!("Nothing to record."),
            }
            debug_assert_eq!(session.state(), TimerState::Idle);
        }

        Commands::Stats {
            email,
            period,
            project,
            tz_offset,
        } => {
            let user = store
                .find_user_by_email(&email)
                .ok_or_else(|| anyhow!("No account for {}", email))?;
            let period = parse_period(&period)?;

            let offset = tz_offset
                .checked_mul(60)
                .and_then(chrono::FixedOffset::east_opt)
                .ok_or_else(|| anyhow!("Invalid tz_offset: {}", tz_offset))?;
            let now = Utc::now().with_timezone(&offset);

            let projects = store.list_projects(&user.id);
            let project_id = match &project {
                Some(name) => Some(
                    store
                        .find_project_by_name(&user.id, name)
                        .map(|p| p.id)
                        .ok_or_else(|| anyhow!("No project named '{}'", name))?,
                ),
                None => None,
            };

            let sprints = store.list_sprints(&user.id);
            let selected = filter_sprints(&sprints, period, project_id.as_ref(), now);
            let metrics = compute_metrics(&selected);

            println!("{} — {}", period.label(), email);
            println!("  Total time:     {}", metrics.total_time);
            println!("  Sprints:        {}", metrics.sprint_count);
            println!("  Average sprint: {}", metrics.average_sprint);

            let buckets = chart_buckets(&selected, period, project_id.as_ref(), &projects, now);
            let scale = calculate_y_axis_domain(max_bucket_seconds(&buckets));
            println!(
                "\n  {:<12} {:>10}   (axis to {})",
                "bucket",
                "time",
                axis_label(scale.domain_max, scale.use_minutes)
            );
            for bucket in &buckets {
                if bucket.future {
                    continue;
                }
                let bar_len = if scale.domain_max > 0 {
                    (bucket.seconds * 30 / scale.domain_max) as usize
                } else {
                    0
                };
                println!(
                    "  {:<12} {:>10}   {}",
                    bucket.label,
                    if bucket.seconds > 0 { bucket.display.as_str() } else { "-" },
                    "#".repeat(bar_len)
                );
            }
        }
    }

    Ok(())
}

fn resolve_project(store: &Store, user: &UserId, name: &str) -> Result<Project> {
    match store.find_project_by_name(user, name) {
        Some(project) => Ok(project),
        None => {
            let project = store.create_project(user, name)?;
            tracing::info!("Created project '{}'", project.name);
            Ok(project)
        }
    }
}

fn parse_mode(s: &str) -> Result<TimerMode> {
    match s {
        "stopwatch" => Ok(TimerMode::Stopwatch),
        "15m" => Ok(TimerMode::FifteenMin),
        "30m" => Ok(TimerMode::ThirtyMin),
        "1h" => Ok(TimerMode::OneHour),
        "2h" => Ok(TimerMode::TwoHours),
        "custom" => Ok(TimerMode::Custom),
        other => bail!("Unknown mode: {}. Use stopwatch, 15m, 30m, 1h, 2h, or custom.", other),
    }
}

fn describe(mode: TimerMode) -> &'static str {
    match mode {
        TimerMode::Stopwatch => "stopwatch",
        TimerMode::FifteenMin => "15 minute countdown",
        TimerMode::ThirtyMin => "30 minute countdown",
        TimerMode::OneHour => "1 hour countdown",
        TimerMode::TwoHours => "2 hour countdown",
        TimerMode::Custom => "custom countdown",
    }
}

fn parse_period(s: &str) -> Result<TimePeriod> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| anyhow!("Unknown period: {}. Use today, this-week, last-week, this-month, last-month, or this-year.", s))
}
