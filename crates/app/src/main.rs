use std::fmt;

use pecs_core::model::{Difficulty, PhaseId, PhaseStatus, PracticeSettings, rounded_percent};
use services::{AppServices, Clock};
use tokio::io::{AsyncBufReadExt, BufReader, stdin};
use tracing_subscriber::EnvFilter;

mod tutor;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPhase { raw: String },
    InvalidDifficulty { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPhase { raw } => write!(f, "invalid phase: {raw} (expected 1-6)"),
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid difficulty: {raw} (expected easy, medium or hard)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  pecs [status]                 show phase unlocks and overall progress");
    eprintln!("  pecs history                  list the last finished sessions");
    eprintln!("  pecs practice <phase>         practise a phase (1-6)");
    eprintln!("  pecs reset [--yes]            start over from phase 1");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>             default sqlite://pecs.sqlite3");
    eprintln!("  --difficulty easy|medium|hard picture discrimination level (phase 3)");
    eprintln!("  --free                        accept any sentence starter in phase 6");
    eprintln!("  --no-pacing                   skip feedback pauses");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PECS_DB_URL, PECS_DIFFICULTY, PECS_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Status,
    History,
    Practice(PhaseId),
    Reset { confirmed: bool },
    Help,
}

#[derive(Debug)]
struct Args {
    command: Command,
    db_url: String,
    settings: PracticeSettings,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut args = args.into_iter();
        let mut db_url = std::env::var("PECS_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://pecs.sqlite3".into(), normalize_sqlite_url);
        let mut settings = PracticeSettings::default();
        if let Ok(raw) = std::env::var("PECS_DIFFICULTY") {
            settings = settings.with_difficulty(parse_difficulty(raw)?);
        }

        let mut subcommand: Option<String> = None;
        let mut phase: Option<PhaseId> = None;
        let mut confirmed = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--difficulty" => {
                    let value = require_value(&mut args, "--difficulty")?;
                    settings = settings.with_difficulty(parse_difficulty(value)?);
                }
                "--free" => settings = settings.with_free_mode(true),
                "--no-pacing" => settings = settings.with_pacing(false),
                "--yes" | "-y" => confirmed = true,
                "--help" | "-h" => subcommand = Some("help".into()),
                _ if arg.starts_with('-') => return Err(ArgsError::UnknownArg(arg)),
                _ if subcommand.is_none() => subcommand = Some(arg),
                _ if subcommand.as_deref() == Some("practice") && phase.is_none() => {
                    phase = Some(parse_phase(arg)?);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match subcommand.as_deref() {
            None | Some("status") => Command::Status,
            Some("history") => Command::History,
            Some("practice") => Command::Practice(phase.ok_or(ArgsError::MissingValue {
                flag: "practice",
            })?),
            Some("reset") => Command::Reset { confirmed },
            Some("help") => Command::Help,
            Some(other) => return Err(ArgsError::UnknownArg(other.to_string())),
        };

        Ok(Self {
            command,
            db_url,
            settings,
        })
    }
}

fn parse_phase(raw: String) -> Result<PhaseId, ArgsError> {
    raw.parse::<u8>()
        .ok()
        .and_then(|n| PhaseId::new(n).ok())
        .ok_or(ArgsError::InvalidPhase { raw })
}

fn parse_difficulty(raw: String) -> Result<Difficulty, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidDifficulty { raw })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

fn status_marker(status: PhaseStatus) -> &'static str {
    match status {
        PhaseStatus::Completed => "[x]",
        PhaseStatus::Current => "[>]",
        PhaseStatus::Available => "[ ]",
        PhaseStatus::Locked => "[-]",
    }
}

async fn show_status(services: &AppServices) {
    let store = services.progress();
    let progress = store.load().await;

    println!("PECS progress for {}", progress.user_id());
    for overview in store.phase_overview(&services.catalog()).await {
        println!(
            "  {} {}. {:<26} {}",
            status_marker(overview.status),
            overview.info.id,
            overview.info.name,
            overview.status.label()
        );
    }
    println!();
    println!("  sessions:      {}", progress.total_sessions());
    println!("  success rate:  {:.0}%", progress.success_rate());
    println!(
        "  last activity: {}",
        progress.last_activity().format("%Y-%m-%d %H:%M")
    );
}

async fn show_history(services: &AppServices) {
    let history = services.recorder().history().await;
    if history.is_empty() {
        println!("No sessions yet.");
        return;
    }

    for session in history {
        let total = session.actions().len();
        let correct = session.correct_count();
        let rate = match (u32::try_from(correct), u32::try_from(total)) {
            (Ok(c), Ok(t)) => rounded_percent(c, t),
            _ => 0,
        };
        println!(
            "{}  phase {}  {correct}/{total} correct ({rate}%)  {}",
            session.started_at().format("%Y-%m-%d %H:%M"),
            session.phase(),
            if session.success() { "mastered" } else { "stopped" }
        );
    }
}

async fn confirm(question: &str) -> std::io::Result<bool> {
    eprint!("{question} [y/N] ");
    let mut lines = BufReader::new(stdin()).lines();
    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

async fn reset(services: &AppServices, confirmed: bool) -> std::io::Result<()> {
    if !confirmed && !confirm("Reset all progress?").await? {
        println!("Nothing changed.");
        return Ok(());
    }
    services.progress().reset().await;
    println!("Progress reset. Phase 1 is unlocked.");
    Ok(())
}

async fn practice(
    services: &AppServices,
    phase: PhaseId,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = services.practice();
    let session = service.start(phase).await?;
    if let Some(info) = services.catalog().phase(phase) {
        println!("Phase {}: {}", info.id, info.name);
        println!("{}", info.instructions);
    }

    let outcome = tutor::run(&service, session).await?;

    let stats = outcome.session.stats()?;
    println!();
    println!(
        "Session over: {}/{} correct ({}%).",
        stats.correct, stats.total, stats.success_rate
    );
    if outcome.mastered {
        match phase.next() {
            Some(next) if outcome.progress.current_phase() == next => {
                println!("Phase {phase} complete! Phase {next} is now unlocked.");
            }
            _ => println!("Phase {phase} complete!"),
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if args.command == Command::Help {
        print_usage();
        return Ok(());
    }

    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, Clock::system(), args.settings).await?;
    tracing::debug!(db = %args.db_url, command = ?args.command, "services ready");

    match args.command {
        Command::Status => show_status(&services).await,
        Command::History => show_history(&services).await,
        Command::Practice(phase) => practice(&services, phase).await?,
        Command::Reset { confirmed } => reset(&services, confirmed).await?,
        Command::Help => {}
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PECS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn no_arguments_shows_status() {
        let args = parse(&["--db", "sqlite::memory:"]).unwrap();
        assert_eq!(args.command, Command::Status);
        assert_eq!(args.db_url, "sqlite::memory:");
    }

    #[test]
    fn practice_takes_a_phase_and_options() {
        let args = parse(&["practice", "3", "--difficulty", "hard", "--no-pacing"]).unwrap();
        assert_eq!(args.command, Command::Practice(PhaseId::new(3).unwrap()));
        assert_eq!(args.settings.difficulty(), Difficulty::Hard);
        assert!(!args.settings.pacing());
        assert!(!args.settings.free_mode());
    }

    #[test]
    fn bad_phase_and_unknown_flags_are_rejected() {
        assert!(matches!(
            parse(&["practice", "7"]),
            Err(ArgsError::InvalidPhase { .. })
        ));
        assert!(matches!(
            parse(&["practice"]),
            Err(ArgsError::MissingValue { .. })
        ));
        assert!(matches!(
            parse(&["--loud"]),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(
            parse(&["status", "extra"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn reset_can_be_preconfirmed() {
        let args = parse(&["reset", "--yes"]).unwrap();
        assert_eq!(args.command, Command::Reset { confirmed: true });
    }

    #[test]
    fn relative_db_paths_become_absolute() {
        let url = normalize_sqlite_url("data/pecs.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/pecs.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite://already.db".into()),
            "sqlite://already.db"
        );
    }
}
