mod audit;
mod auth;
mod calendar;
mod cli;
mod config;
mod directory;
mod guard;
mod profile;
mod routes;
mod session;
mod storage;
mod views;

use anyhow::Result;
use chrono::Datelike;
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "toolbox", about = "A role-based employee portal for the terminal")]
pub struct Args {
    #[arg(short, long, help = "Run a single portal command and exit")]
    pub command: Option<String>,

    #[arg(long, env = "TOOLBOX_DATA_DIR", help = "Directory holding portal state")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Auto-approve confirmations in -c mode")]
    pub yes: bool,

    #[arg(long, help = "Enable tracing of guard decisions")]
    pub trace: bool,

    #[arg(long, help = "List portal routes and exit")]
    pub list_routes: bool,

    #[arg(long, help = "Debug output (print resolved settings)")]
    pub debug: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Load configuration (user, then project, then local overrides)
    let cfg = if let Some(config_path) = &args.config {
        config::Config::load_from(config_path)?
    } else {
        config::Config::load().unwrap_or_default()
    };

    if let Err(errors) = cfg.validate() {
        for error in &errors {
            eprintln!("Config error: {}", error);
        }
        return Err(anyhow::anyhow!("invalid configuration"));
    }

    // Handle --list-routes: dump the navigation surface and exit
    if args.list_routes {
        cli::print_routes();
        return Ok(());
    }

    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| cfg.resolve_data_dir());
    std::fs::create_dir_all(&data_dir)?;

    if args.debug {
        eprintln!("[DEBUG] Data dir: {}", data_dir.display());
        eprintln!("[DEBUG] Audit enabled: {}", cfg.audit.enabled);
        eprintln!("[DEBUG] Confirm delete: {}", cfg.portal.confirm_delete);
        eprintln!(
            "[DEBUG] Default route: {}",
            cfg.portal.default_route.as_deref().unwrap_or("(by role)")
        );
    }

    let session_id = uuid::Uuid::new_v4().to_string();
    let audit = if cfg.audit.enabled {
        let audit_path = cfg
            .resolve_audit_dir(&data_dir)
            .join(format!("{}.jsonl", session_id));
        Some(RefCell::new(audit::Audit::new(&audit_path, &session_id)?))
    } else {
        None
    };

    // Session and directory each own their document under the data dir;
    // one process is the only writer.
    let sessions = session::SessionStore::new(storage::FileStorage::new(&data_dir)?);
    let directory = directory::UserDirectory::new(storage::FileStorage::new(&data_dir)?);

    let today = chrono::Local::now().date_naive();
    let trace = args.trace;
    let ctx = cli::Context {
        args,
        config: cfg,
        data_dir,
        session_id,
        audit,
        sessions: RefCell::new(sessions),
        directory: RefCell::new(directory),
        notes: RefCell::new(calendar::Notes::new()),
        route: RefCell::new(routes::Route::Login),
        calendar_month: RefCell::new((today.year(), today.month())),
        tracing: RefCell::new(trace),
    };

    if let Some(command) = ctx.args.command.clone() {
        cli::run_once(&ctx, &command)
    } else {
        cli::run_repl(ctx)
    }
}
