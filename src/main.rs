use clap::Parser;
use config::{Config, Environment, File};
use csvdb::executor::QueryResult;
use csvdb::printer::render_rows;
use csvdb::{DatabaseError, Session};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

const PROMPT: &str = "csvdb> ";
const CONTINUATION_PROMPT: &str = "....... ";

/// csvdb interactive shell
#[derive(Parser, Debug)]
#[command(name = "csvdb")]
#[command(about = "File-backed columnar database with a small SQL dialect", long_about = None)]
struct Args {
    /// Directory holding the table directories
    #[arg(short = 'd', long)]
    rootdir: Option<PathBuf>,

    /// Run the statements of a script file and exit
    #[arg(short = 'r', long = "run", value_name = "FILENAME")]
    run: Option<PathBuf>,

    /// Log execution details and report skipped statements
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Do not read or write the shell history file
    #[arg(long)]
    no_history: bool,
}

/// Shell configuration
#[derive(Debug, Deserialize)]
struct CliConfig {
    #[serde(default = "default_rootdir")]
    rootdir: PathBuf,
    #[serde(default)]
    verbose: bool,
    #[serde(default = "default_history")]
    history: bool,
}

fn default_rootdir() -> PathBuf { PathBuf::from(".") }
fn default_history() -> bool { true }

impl CliConfig {
    /// Load configuration with priority: CLI args > ENV > config file > defaults
    fn load(args: &Args) -> Self {
        // 1. Optional ./csvdb.toml, then CSVDB_* environment variables
        let base_config = Config::builder()
            .add_source(File::with_name("csvdb").required(false))
            .add_source(Environment::with_prefix("CSVDB"))
            .build()
            .ok()
            .and_then(|c| c.try_deserialize::<Self>().ok())
            .unwrap_or_else(|| Self {
                rootdir: default_rootdir(),
                verbose: false,
                history: default_history(),
            });

        // 2. CLI args override everything
        Self {
            rootdir: args.rootdir.clone().unwrap_or(base_config.rootdir),
            verbose: args.verbose || base_config.verbose,
            history: !args.no_history && base_config.history,
        }
    }
}

fn report(outcome: Result<QueryResult, DatabaseError>, verbose: bool) {
    match outcome {
        Ok(QueryResult::Success(message)) => println!("{message}"),
        Ok(QueryResult::Skipped(message)) => {
            if verbose {
                println!("{message}");
            }
        }
        Ok(QueryResult::Rows(stream)) => match render_rows(stream) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => eprintln!("CSVDB SQL error:\n{e}"),
        },
        Err(e) if e.is_syntax() => eprintln!("{e}"),
        Err(e) => eprintln!("CSVDB SQL error:\n{e}"),
    }
}

fn run_file(session: &mut Session, path: &Path, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut script = fs::read_to_string(path)
        .map_err(|e| format!("cannot read script {}: {e}", path.display()))?;
    if !script.trim_end().ends_with(';') {
        script.push(';');
    }
    session.run_script(&script, |outcome| report(outcome, verbose));
    Ok(())
}

fn run_shell(session: &mut Session, config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut rl = DefaultEditor::new()?;

    let history_file = if config.history {
        dirs::home_dir().map(|mut p| {
            p.push(".csvdb_history");
            p
        })
    } else {
        None
    };
    if let Some(ref path) = history_file {
        let _ = rl.load_history(path); // Ignore error if file doesn't exist
    }

    println!("csvdb {} - root directory {}", env!("CARGO_PKG_VERSION"), config.rootdir.display());
    println!("Statements end with ';'. Type 'exit' or 'quit' to leave.\n");

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { PROMPT } else { CONTINUATION_PROMPT };
        let line = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let trimmed = line.trim();
        if buffer.is_empty() {
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
                break;
            }
        }

        // An empty continuation line terminates the statement.
        if trimmed.is_empty() {
            buffer.push(';');
        } else {
            if !buffer.is_empty() {
                buffer.push('\n');
            }
            buffer.push_str(&line);
        }

        if buffer.trim_end().ends_with(';') {
            let _ = rl.add_history_entry(buffer.as_str());
            session.run_script(&buffer, |outcome| report(outcome, config.verbose));
            buffer.clear();
        }
    }

    if let Some(ref path) = history_file {
        let _ = rl.save_history(path);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = CliConfig::load(&args);

    let level = if config.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    let mut session = Session::open(&config.rootdir)?;
    match &args.run {
        Some(path) => run_file(&mut session, path, config.verbose),
        None => run_shell(&mut session, &config),
    }
}
