use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mandex::index::{self, BuildOptions, Progress, rebuild_index};
use mandex::output;
use mandex::pages::{PageSource, SystemPages};
use mandex::query;
use mandex::utils::{self, AppConfig, CancelToken, LogTarget};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "mandex")]
#[command(about = "Browse, search and read installed manual pages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Initial keyword query (when no subcommand is given)
    #[arg(trailing_var_arg = true)]
    query: Vec<String>,

    /// Additional directory to scan for pages (repeatable)
    #[arg(short = 'M', long = "manpath", global = true)]
    man_paths: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or rebuild the full-text index
    Index,
    /// Full-text search over page bodies
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,

        /// Print results instead of opening the browser
        #[arg(long)]
        plain: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Show index statistics
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let interactive = match &cli.command {
        None => true,
        Some(Commands::Search { plain, .. }) => !plain,
        Some(_) => false,
    };
    let target = if interactive {
        LogTarget::FileOnly
    } else {
        LogTarget::FileAndStderr
    };
    if let Err(e) = utils::init_logging(target) {
        eprintln!("warning: logging disabled: {:#}", e);
    }

    let mut config = AppConfig::load()?;
    config.man_paths.extend(cli.man_paths);
    let source = Arc::new(SystemPages::new(&config.man_paths));

    match cli.command {
        Some(Commands::Index) => build_index(&config, source.as_ref())?,
        Some(Commands::Search {
            query,
            plain,
            no_color,
        }) => deep_search(&config, source, &query.join(" "), plain, !no_color)?,
        Some(Commands::Stats) => index::stats::show_stats(&config.index_path()?)?,
        None => {
            let query = (!cli.query.is_empty()).then(|| cli.query.join(" "));
            browse(source, &config, query)?;
        }
    }

    Ok(())
}

fn build_index(config: &AppConfig, source: &SystemPages) -> Result<()> {
    let location = config.index_path()?;
    let start = Instant::now();

    let spinner = utils::progress::spinner("Scanning manual pages...");
    let catalog = source.list().context("Failed to list manual pages")?;
    spinner.finish_and_clear();

    let pb = utils::progress::indexing_bar(catalog.len() as u64);
    let report = rebuild_index(
        &location,
        &catalog,
        source,
        &BuildOptions::from_config(config),
        &CancelToken::new(),
        &mut |progress: Progress| pb.set_position(progress.processed as u64),
    )
    .with_context(|| format!("Failed to build index at {}", location.display()))?;
    pb.finish_and_clear();

    println!(
        "Indexed {} pages in {:.2}s ({} could not be read)",
        report.indexed,
        start.elapsed().as_secs_f64(),
        report.failed()
    );
    println!("Index location: {}", location.display());

    Ok(())
}

fn deep_search(
    config: &AppConfig,
    source: Arc<SystemPages>,
    query: &str,
    plain: bool,
    color: bool,
) -> Result<()> {
    let results = query::search(&config.index_path()?, query)?;

    if plain {
        return print_plain(source.as_ref(), query, &results, color);
    }
    open_results(source, config, query.to_string(), results, color)
}

fn print_plain(
    source: &SystemPages,
    query: &str,
    results: &[query::SearchResult],
    color: bool,
) -> Result<()> {
    if results.is_empty() {
        let catalog = source.list().context("Failed to list manual pages")?;
        let suggestions = query::suggest(query, &catalog);
        output::print_suggestions(query, &suggestions, color)?;
    } else {
        output::print_search_results(results, query, color)?;
    }
    Ok(())
}

#[cfg(feature = "interactive")]
fn open_results(
    source: Arc<SystemPages>,
    config: &AppConfig,
    query: String,
    results: Vec<query::SearchResult>,
    _color: bool,
) -> Result<()> {
    launch_browser(source, config, mandex::tui::Launch::Search { query, results })
}

#[cfg(feature = "interactive")]
fn browse(source: Arc<SystemPages>, config: &AppConfig, query: Option<String>) -> Result<()> {
    launch_browser(source, config, mandex::tui::Launch::Browse(query))
}

#[cfg(feature = "interactive")]
fn launch_browser(
    source: Arc<SystemPages>,
    config: &AppConfig,
    launch: mandex::tui::Launch,
) -> Result<()> {
    let source: Arc<dyn PageSource> = source;
    mandex::tui::run(source, config, launch)
}

#[cfg(not(feature = "interactive"))]
fn open_results(
    source: Arc<SystemPages>,
    _config: &AppConfig,
    query: String,
    results: Vec<query::SearchResult>,
    color: bool,
) -> Result<()> {
    print_plain(source.as_ref(), &query, &results, color)
}

#[cfg(not(feature = "interactive"))]
fn browse(_source: Arc<SystemPages>, _config: &AppConfig, _query: Option<String>) -> Result<()> {
    anyhow::bail!("built without the `interactive` feature; use `mandex search --plain`")
}
