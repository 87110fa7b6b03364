#![forbid(unsafe_code)]

use std::io::{self, Write as _};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{CommandFactory as _, Parser, Subcommand};
use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::config::{self, Config, Environment};
use crate::derive::{self, RECENT_ACTIVITY_LIMIT, TaskStats, timefmt};
use crate::error::MissionBaseError;
use crate::logging::{self, LogTarget};
use crate::model::Snapshot;
use crate::output::table::Table;
use crate::tui;
use crate::tui::app::DashboardOptions;

#[derive(Debug, Parser)]
#[command(
    name = "mission-base",
    version,
    about = "Terminal dashboard for Mission Base tasks, agents and activity"
)]
pub struct Cli {
    /// API base URL (overrides MISSION_BASE_API_URL and the config file)
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,
    /// Backend environment used when no URL is configured
    #[arg(long = "env", value_enum, global = true)]
    pub env: Option<Environment>,
    /// Poll interval in seconds
    #[arg(short = 'i', long = "interval", global = true)]
    pub interval_seconds: Option<u64>,
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch once and print tasks, agents and recent activity
    Snapshot(SnapshotArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
    Version,
}

#[derive(Debug, Parser)]
pub struct SnapshotArgs {
    /// Output as JSON
    #[arg(long = "json", conflicts_with = "csv")]
    pub json: bool,
    /// Output tasks as CSV
    #[arg(long = "csv")]
    pub csv: bool,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    pub shell: clap_complete::Shell,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
    Set(ConfigSetArgs),
    Get(ConfigGetArgs),
}

#[derive(Debug, Parser)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Parser)]
pub struct ConfigGetArgs {
    pub key: String,
}

/// Flags that override the loaded config for this invocation.
#[derive(Debug, Clone, Default)]
struct Overrides {
    api_url: Option<String>,
    env: Option<Environment>,
    interval_seconds: Option<u64>,
}

impl Overrides {
    fn apply(&self, cfg: &mut Config) {
        if let Some(env) = self.env {
            cfg.api.environment = env;
        }
        if let Some(secs) = self.interval_seconds {
            cfg.api.poll_interval_ms = secs.saturating_mul(1000);
        }
    }
}

/// `local_offset` must be captured before the runtime starts its worker
/// threads; see `main.rs`.
pub async fn main(local_offset: UtcOffset) -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli, local_offset).await;
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli, local_offset: UtcOffset) -> anyhow::Result<ExitCode> {
    let overrides = Overrides {
        api_url: cli.api_url,
        env: cli.env,
        interval_seconds: cli.interval_seconds,
    };

    match cli.cmd {
        None => cmd_default(&overrides, local_offset).await,
        Some(Commands::Snapshot(args)) => cmd_snapshot(&overrides, &args, local_offset).await,
        Some(Commands::Completion(args)) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "mission-base", &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Config(args)) => match args.cmd {
            ConfigCmd::List => {
                print!("{}", config::list_resolved_toml()?);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Set(set) => {
                config::set_value_string(&set.key, &set.value)?;
                println!("Set {} = {}", set.key, set.value);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Get(get) => {
                let val = config::get_value_string(&get.key)?;
                match val {
                    Some(v) => {
                        println!("{v}");
                        Ok(ExitCode::SUCCESS)
                    }
                    None => anyhow::bail!(
                        "configuration key '{}' not found - use 'mission-base config list' to see available keys",
                        get.key
                    ),
                }
            }
        },
        Some(Commands::Version) => Ok(cmd_version()),
    }
}

async fn load_cfg(overrides: &Overrides) -> anyhow::Result<Config> {
    let mut cfg = tokio::task::spawn_blocking(|| -> anyhow::Result<Config> {
        let (cfg, _doc, _paths) = config::load()?;
        Ok(cfg)
    })
    .await
    .map_err(|e| {
        if e.is_cancelled() {
            MissionBaseError::Cancelled
        } else {
            MissionBaseError::Other(format!("config loader failed: {e}"))
        }
    })??;
    overrides.apply(&mut cfg);
    cfg.validate()?;
    Ok(cfg)
}

fn log_target_for_tui(cfg: &Config) -> anyhow::Result<LogTarget> {
    let path = if cfg.log.file.trim().is_empty() {
        config::default_log_path()?
    } else {
        config::expand_path(&cfg.log.file)?
    };
    Ok(LogTarget::File(path))
}

async fn cmd_default(overrides: &Overrides, local_offset: UtcOffset) -> anyhow::Result<ExitCode> {
    let cfg = load_cfg(overrides).await?;
    let base_url = cfg.resolve_base_url(overrides.api_url.as_deref());

    if tui::is_tty() {
        logging::init(&cfg.log.level, &log_target_for_tui(&cfg)?)?;
        crate::tui::app::run(DashboardOptions {
            cfg,
            base_url,
            local_offset,
        })
        .await?;
        return Ok(ExitCode::SUCCESS);
    }

    // Non-TTY fallback: one fetch cycle printed as plain text.
    logging::init(&cfg.log.level, &LogTarget::Stderr)?;
    let snapshot = fetch_once(&cfg, &base_url).await?;
    let now = OffsetDateTime::now_utc();
    write_summary(io::stdout().lock(), &snapshot, now, local_offset)?;
    Ok(ExitCode::SUCCESS)
}

async fn cmd_snapshot(
    overrides: &Overrides,
    args: &SnapshotArgs,
    local_offset: UtcOffset,
) -> anyhow::Result<ExitCode> {
    let cfg = load_cfg(overrides).await?;
    logging::init(&cfg.log.level, &LogTarget::Stderr)?;
    let base_url = cfg.resolve_base_url(overrides.api_url.as_deref());
    let snapshot = fetch_once(&cfg, &base_url).await?;
    let now = OffsetDateTime::now_utc();

    if args.json {
        let report = SnapshotReport::new(&snapshot, now);
        let json = serde_json::to_string_pretty(&report)?;
        println!("{json}");
    } else if args.csv {
        tasks_table(&snapshot, local_offset).write_csv()?;
    } else {
        write_summary(io::stdout().lock(), &snapshot, now, local_offset)?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn fetch_once(cfg: &Config, base_url: &str) -> anyhow::Result<Snapshot> {
    let client = ApiClient::new(base_url, cfg.request_timeout())?;
    info!(base_url = %client.base_url(), "fetching snapshot");
    let snapshot = client
        .snapshot()
        .await
        .with_context(|| format!("failed to fetch snapshot from {base_url}"))?;
    debug!(
        tasks = snapshot.tasks.len(),
        agents = snapshot.agents.len(),
        activity = snapshot.activity.len(),
        "snapshot fetched"
    );
    Ok(snapshot)
}

#[derive(Debug, Serialize)]
struct AgentRow<'a> {
    id: &'a str,
    name: &'a str,
    role: &'a str,
    status: derive::AgentStatus,
    open_tasks: usize,
    last_activity: Option<String>,
}

#[derive(Debug, Serialize)]
struct SnapshotReport<'a> {
    stats: TaskStats,
    agents: Vec<AgentRow<'a>>,
    #[serde(flatten)]
    snapshot: &'a Snapshot,
}

impl<'a> SnapshotReport<'a> {
    fn new(snapshot: &'a Snapshot, now: OffsetDateTime) -> Self {
        let agents = snapshot
            .agents
            .iter()
            .map(|agent| AgentRow {
                id: &agent.id,
                name: &agent.name,
                role: &agent.role,
                status: derive::agent_status(agent, &snapshot.activity, now),
                open_tasks: derive::open_task_count(&agent.id, &snapshot.tasks),
                last_activity: derive::last_activity_ago(agent, &snapshot.activity, now),
            })
            .collect();
        Self {
            stats: TaskStats::tally(&snapshot.tasks),
            agents,
            snapshot,
        }
    }
}

fn tasks_table(snapshot: &Snapshot, offset: UtcOffset) -> Table {
    let mut table = Table::new(["ID", "TITLE", "STATUS", "PRIORITY", "ASSIGNEE", "CREATED", "DUE"]);
    for task in &snapshot.tasks {
        let assignee = derive::resolve_assignee(task.assignee.as_deref(), &snapshot.agents);
        table.row([
            task.id.clone(),
            task.title.clone(),
            task.status.to_string(),
            task.priority_label().to_owned(),
            assignee.name.to_owned(),
            timefmt::format_date(&task.created_at, offset),
            task.due_date
                .as_deref()
                .map(|d| timefmt::format_date(d, offset))
                .unwrap_or_default(),
        ]);
    }
    table
}

/// Plain-text dashboard: stats line, agent table and the recent activity feed.
fn write_summary(
    mut out: impl io::Write,
    snapshot: &Snapshot,
    now: OffsetDateTime,
    offset: UtcOffset,
) -> io::Result<()> {
    let stats = TaskStats::tally(&snapshot.tasks);
    writeln!(
        out,
        "Tasks: {} total • {} completed • {} in progress • {} in review • {} assigned • {} backlog",
        stats.total, stats.completed, stats.in_progress, stats.review, stats.assigned, stats.backlog
    )?;
    writeln!(out)?;

    if snapshot.agents.is_empty() {
        writeln!(out, "No agents")?;
    } else {
        let mut agents = Table::new(["AGENT", "ROLE", "STATUS", "OPEN TASKS", "LAST ACTIVITY"]);
        for tile in derive::agent_tiles(&snapshot.agents, &snapshot.tasks, &snapshot.activity, now) {
            agents.row([
                tile.agent.name.clone(),
                tile.agent.role.clone(),
                tile.status.as_str().to_owned(),
                tile.open_tasks.to_string(),
                tile.last_activity.unwrap_or_else(|| "-".to_owned()),
            ]);
        }
        agents.write_to(&mut out)?;
    }
    writeln!(out)?;

    if snapshot.activity.is_empty() {
        writeln!(out, "No recent activity")?;
        return Ok(());
    }
    let mut feed = Table::new(["TIME", "AGENT", "TYPE", "TEXT"]).max_cell_width(72);
    for item in snapshot.activity.iter().take(RECENT_ACTIVITY_LIMIT) {
        feed.row([
            timefmt::format_stamp_short(&item.timestamp, offset),
            item.agent.clone(),
            item.kind.clone(),
            item.text.clone(),
        ]);
    }
    feed.write_to(&mut out)
}

fn cmd_version() -> ExitCode {
    println!("mission-base version {}", env!("CARGO_PKG_VERSION"));
    println!("  rust: {}", rustc_version_runtime::version());
    println!(
        "  os/arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    let _ = io::stdout().flush();
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::{ActivityItem, Agent};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_and_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mission-base",
            "--env",
            "dev",
            "snapshot",
            "--json",
            "--api-url",
            "http://127.0.0.1:9/api",
        ])
        .unwrap();
        assert_eq!(cli.env, Some(Environment::Development));
        assert_eq!(cli.api_url.as_deref(), Some("http://127.0.0.1:9/api"));
        assert!(matches!(cli.cmd, Some(Commands::Snapshot(SnapshotArgs { json: true, csv: false }))));
    }

    #[test]
    fn json_and_csv_conflict() {
        assert!(Cli::try_parse_from(["mission-base", "snapshot", "--json", "--csv"]).is_err());
    }

    #[test]
    fn overrides_apply_to_config() {
        let mut cfg = Config::default();
        Overrides {
            api_url: None,
            env: Some(Environment::Production),
            interval_seconds: Some(30),
        }
        .apply(&mut cfg);
        assert_eq!(cfg.api.environment, Environment::Production);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn summary_lists_stats_agents_and_activity() {
        let snapshot = Snapshot {
            tasks: serde_json::from_value(serde_json::json!([
                {"id": 1, "status": "done", "assignee": "scout"},
                {"id": 2, "status": "backlog", "assignee": "scout"}
            ]))
            .unwrap(),
            agents: vec![Agent {
                id: "scout".to_owned(),
                name: "Scout".to_owned(),
                role: "Research".to_owned(),
                emoji: "🔭".to_owned(),
            }],
            activity: vec![ActivityItem {
                agent: "scout".to_owned(),
                kind: "TASK COMPLETED".to_owned(),
                text: "Finished survey".to_owned(),
                timestamp: "2024-05-01T12:00:00Z".to_owned(),
            }],
        };
        let now = OffsetDateTime::parse(
            "2024-05-01T12:05:00Z",
            &time::format_description::well_known::Rfc3339,
        )
        .unwrap();

        let mut buf = Vec::new();
        write_summary(&mut buf, &snapshot, now, UtcOffset::UTC).unwrap();
        let out = String::from_utf8(buf).unwrap();

        assert!(out.starts_with("Tasks: 2 total • 1 completed"));
        assert!(out.contains("1 backlog"));
        let agent_line = out.lines().find(|l| l.starts_with("Scout")).unwrap();
        assert!(agent_line.contains("active"));
        assert!(agent_line.contains("5m ago"));
        assert!(out.contains("May 1, 12:00 PM"));
        assert!(out.contains("Finished survey"));
    }

    #[test]
    fn empty_snapshot_summary() {
        let mut buf = Vec::new();
        write_summary(
            &mut buf,
            &Snapshot::default(),
            OffsetDateTime::UNIX_EPOCH,
            UtcOffset::UTC,
        )
        .unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("No agents"));
        assert!(out.contains("No recent activity"));
    }
}
