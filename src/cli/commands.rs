//! CLI commands implementation.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{load_settings, Settings};
use crate::server::AppState;

#[derive(Parser)]
#[command(name = "newsvault")]
#[command(about = "News content acquisition and detail-extraction system")]
#[command(version)]
pub struct Cli {
    /// Data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the web server
    Serve {
        /// Bind address (host:port), overrides config
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run detail extraction for warehouse items
    Extract {
        /// Warehouse item IDs to extract
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Manage extraction rules
    Rule {
        #[command(subcommand)]
        command: RuleCommands,
    },
}

#[derive(Subcommand)]
enum RuleCommands {
    /// List extraction rules
    List,
    /// Show one rule with its auto-repair history
    Show { id: i64 },
    /// Add a rule
    Add {
        site_name: String,
        site_url: String,
        title_xpath: String,
        content_xpath: String,
        /// Request headers as a JSON object
        #[arg(long)]
        headers: Option<String>,
    },
    /// Remove a rule
    Rm { id: i64 },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Init => cmd_init(&settings),
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                settings.bind = bind;
            }
            cmd_serve(&settings).await
        }
        Commands::Extract { ids } => cmd_extract(&settings, &ids).await,
        Commands::Rule { command } => cmd_rule(&settings, command),
    }
}

fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.init()?;
    // Opening the state once creates every table.
    AppState::new(settings)?;
    println!(
        "{} Initialized data directory at {}",
        style("✓").green(),
        settings.data_dir.display()
    );
    Ok(())
}

async fn cmd_serve(settings: &Settings) -> anyhow::Result<()> {
    settings.init()?;
    println!(
        "{} Starting NewsVault server at http://{}",
        style("→").cyan(),
        settings.bind
    );
    println!("  Press Ctrl+C to stop");
    crate::server::serve(settings).await
}

async fn cmd_extract(settings: &Settings, ids: &[i64]) -> anyhow::Result<()> {
    settings.init()?;
    let state = AppState::new(settings)?;

    let bar = ProgressBar::new(ids.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut success = 0usize;
    let mut failed = 0usize;
    for &id in ids {
        bar.set_message(format!("item {}", id));
        let report = state.pipeline.run_one(id).await;
        if report.outcome.is_success() {
            success += 1;
        } else {
            failed += 1;
            bar.println(format!(
                "  {} item {}: {}",
                style("✗").red(),
                id,
                report.outcome.message()
            ));
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    println!(
        "{} Extraction finished: {} succeeded, {} failed",
        style("✓").green(),
        success,
        failed
    );
    Ok(())
}

fn cmd_rule(settings: &Settings, command: RuleCommands) -> anyhow::Result<()> {
    settings.init()?;
    let state = AppState::new(settings)?;

    match command {
        RuleCommands::List => {
            let rules = state.rules.list(None, 200, 0)?;
            if rules.is_empty() {
                println!("No extraction rules defined");
                return Ok(());
            }
            for rule in rules {
                println!(
                    "{:>4}  {}  title={}  content={}",
                    rule.id,
                    style(&rule.site_name).bold(),
                    rule.title_xpath,
                    rule.content_xpath
                );
            }
            Ok(())
        }
        RuleCommands::Show { id } => {
            let Some(rule) = state.rules.get(id)? else {
                anyhow::bail!("rule {} not found", id);
            };
            println!("{} ({})", style(&rule.site_name).bold(), rule.site_url);
            println!("  title xpath:   {}", rule.title_xpath);
            println!("  content xpath: {}", rule.content_xpath);
            if let Some(headers) = &rule.request_headers {
                println!("  headers:       {}", headers);
            }
            let revisions = state.rules.revisions(id)?;
            if !revisions.is_empty() {
                println!("  auto-repair history:");
                for rev in revisions {
                    println!(
                        "    {}  item {}  content: {} -> {}",
                        rev.changed_at.format("%Y-%m-%d %H:%M"),
                        rev.triggered_by_item,
                        rev.old_content_xpath,
                        rev.new_content_xpath
                    );
                }
            }
            Ok(())
        }
        RuleCommands::Add {
            site_name,
            site_url,
            title_xpath,
            content_xpath,
            headers,
        } => {
            let id = state.rules.create(
                &site_name,
                &site_url,
                &title_xpath,
                &content_xpath,
                headers.as_deref(),
                0,
            )?;
            println!("{} Rule {} created for {}", style("✓").green(), id, site_name);
            Ok(())
        }
        RuleCommands::Rm { id } => {
            if state.rules.delete(id)? {
                println!("{} Rule {} removed", style("✓").green(), id);
            } else {
                anyhow::bail!("rule {} not found", id);
            }
            Ok(())
        }
    }
}
