// remember - search everything you ever typed in your shell
//
// Thin front end over the library: parses args, opens the store, prints.
// Picking and re-running a result is left to the shell aliases.

use anyhow::Context;
use clap::{Parser, Subcommand};
use remember_lib::{
    core::{
        curate,
        history::{append_to_history, DEFAULT_THRESHOLD, INTERACTIVE_THRESHOLD},
        last_search, start_history_processing, IngestReport, SearchQuery, Searcher,
    },
    display, CommandInput, RememberError, RememberPaths, Store,
};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "remember", version, about = "Your shell history, deduplicated, ranked and searchable")]
struct Cli {
    /// Directory holding remember.db, ignore_rules.txt and the last results
    #[arg(long, global = true)]
    save_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest new entries of a history file into the store
    Generate {
        history_file: PathBuf,
    },
    /// Search stored commands (any term may match)
    Search {
        #[arg(required = true)]
        terms: Vec<String>,
        /// Only commands starting with a term
        #[arg(short, long)]
        startswith: bool,
        /// Also search the command info
        #[arg(short, long)]
        all: bool,
        /// Maximum number of results
        #[arg(short, long, default_value_t = 10_000)]
        max: usize,
        /// Ingest this history file before searching
        #[arg(long)]
        history: Option<PathBuf>,
        /// Minimum number of new history entries before ingesting
        #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: usize,
    },
    /// Commands run in the current directory
    Local {
        history_file: PathBuf,
        terms: Vec<String>,
        #[arg(short, long, default_value_t = 10_000)]
        max: usize,
    },
    /// Store a single command
    Add {
        command: String,
        /// Directory the command belongs to
        #[arg(long)]
        dir: Option<String>,
    },
    /// Delete a command from the store
    Delete {
        command: String,
    },
    /// Set the searchable info of a command
    Info {
        command: String,
        info: String,
    },
    /// Print result number N of the last search
    Last {
        index: usize,
        /// Also append the command to this history file
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Show store statistics
    Status,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<RememberError>() {
            Some(err) => eprintln!("Error: {}", err.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = RememberPaths::resolve(cli.save_dir)?;
    let color = std::io::stdout().is_terminal() && !cli.json;

    let store = Arc::new(
        Store::open(paths.db_path())
            .await
            .with_context(|| format!("opening {}", paths.db_path().display()))?,
    );

    let outcome = dispatch(cli.command, &paths, Arc::clone(&store), cli.json, color).await;
    store.close().await;
    outcome
}

async fn dispatch(
    command: Commands,
    paths: &RememberPaths,
    store: Arc<Store>,
    json: bool,
    color: bool,
) -> anyhow::Result<()> {
    match command {
        Commands::Generate { history_file } => {
            let report =
                start_history_processing(store, &history_file, paths, INTERACTIVE_THRESHOLD)
                    .await?;
            print_report(&report, json)?;
        }
        Commands::Search {
            terms,
            startswith,
            all,
            max,
            history,
            threshold,
        } => {
            if let Some(history_file) = history {
                start_history_processing(Arc::clone(&store), &history_file, paths, threshold)
                    .await?;
            }

            let mut query = SearchQuery::new(terms.clone());
            query.starts_with = startswith;
            query.search_info = all;

            let results = Searcher::new(store).search(&query).await?;
            if !json {
                println!("Looking for all past commands with: {}", terms.join(", "));
                println!("Number of results found: {}", results.len());
                if results.len() > max {
                    println!("Results truncated to the first: {}", max);
                }
            }
            let results = remember_lib::core::searcher::truncate_results(results, max);

            last_search::save_last_search(paths.last_results_path(), &results)?;
            print_results(&results, &terms, json, color)?;
        }
        Commands::Local {
            history_file,
            terms,
            max,
        } => {
            start_history_processing(Arc::clone(&store), &history_file, paths, INTERACTIVE_THRESHOLD)
                .await?;

            let cwd = std::env::current_dir()?;
            let directory = cwd.to_string_lossy();
            let results = Searcher::new(store).search_directory(&directory, &terms).await?;
            if !json {
                println!("Looking for all past commands in: {}", directory);
                println!("Number of results found: {}", results.len());
            }
            let results = remember_lib::core::searcher::truncate_results(results, max);

            last_search::save_last_search(paths.last_results_path(), &results)?;
            print_results(&results, &terms, json, color)?;
        }
        Commands::Add { command, dir } => {
            let curated = curate(&command);
            let mut input = CommandInput::new(curated.clone());
            if let Some(dir) = dir {
                input = input.in_directory(dir);
            }
            store.add_command(input).await?;
            println!("Stored: {}", curated);
        }
        Commands::Delete { command } => {
            let curated = curate(&command);
            if store.delete_command(&curated).await? {
                println!("Deleted: {}", curated);
            } else {
                return Err(RememberError::CommandNotFound(curated).into());
            }
        }
        Commands::Info { command, info } => {
            let curated = curate(&command);
            if !store.update_command_info(&curated, &info).await? {
                return Err(RememberError::CommandNotFound(curated).into());
            }
            if let Some(updated) = store.get_command(&curated).await? {
                display::print_commands(&[updated], &[] as &[&str], color);
            }
        }
        Commands::Status => {
            let stats = store.stats().await?;
            println!("remember status");
            println!("{}", "=".repeat(60));
            println!("  Save dir:     {}", paths.save_dir().display());
            println!("  Store:        {}", store.path().display());
            println!("  Commands:     {}", stats.total_commands);
            println!("  Directories:  {}", stats.total_directories);
            println!("  Associations: {}", stats.total_contexts);
            println!("{}", "=".repeat(60));
        }
        Commands::Last { index, history } => {
            let command = last_search::command_at(paths.last_results_path(), index)?;
            if let Some(history_file) = history {
                append_to_history(&history_file, &command)?;
            }
            println!("{}", command);
        }
    }

    Ok(())
}

fn print_results(
    results: &[remember_lib::Command],
    terms: &[String],
    json: bool,
    color: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
    } else {
        display::print_commands(results, terms, color);
    }
    Ok(())
}

fn print_report(report: &IngestReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!(
            "Read {} history file: {} new entries, {} stored, {} ignored",
            report.file_type, report.extracted, report.stored, report.ignored
        );
        if !report.marked {
            println!("Below the threshold, nothing was written");
        }
    }
    Ok(())
}
