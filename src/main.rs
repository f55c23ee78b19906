use anyhow::Result;
use clap::{Parser, Subcommand};
use depmap::{
    aggregate::{Aggregator, ScrapedGroup},
    cache::Cache,
    config::{Config, PackageGroups},
    output::{print_summary, write_combined},
    registry::default_lookup,
    scraper::Scraper,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const PARTIAL: u8 = 2;
}

#[derive(Parser)]
#[command(name = "depmap")]
#[command(
    author,
    version,
    about = "Audit and aggregate dependency usage across project groups"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every configured project and write the combined report
    Scan {
        /// Package-group file
        #[arg(short, long, default_value = "packages.json")]
        groups: PathBuf,

        /// Where to write the combined report
        #[arg(short, long, default_value = "packageMap.json")]
        output: PathBuf,

        /// Restrict the run to one group
        #[arg(long)]
        group: Option<String>,

        /// Skip the unused-dependency check
        #[arg(long)]
        no_prune: bool,

        /// Skip the vulnerability audit
        #[arg(long)]
        no_audit: bool,

        /// Clear the registry cache before scanning
        #[arg(long)]
        clear_cache: bool,
    },

    /// List configured groups and their projects
    Groups {
        /// Package-group file
        #[arg(short, long, default_value = "packages.json")]
        groups: PathBuf,
    },

    /// Show or create the config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Clear the registry cache
    ClearCache,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            groups,
            output,
            group,
            no_prune,
            no_audit,
            clear_cache,
        } => {
            if clear_cache {
                Cache::new().clear()?;
            }
            run_scan(groups, output, group, no_prune, no_audit).await
        }
        Commands::Groups { groups } => {
            list_groups(&groups)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache => {
            Cache::new().clear()?;
            println!("Cache cleared.");
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(
    groups_path: PathBuf,
    output_path: PathBuf,
    group_filter: Option<String>,
    no_prune: bool,
    no_audit: bool,
) -> Result<u8> {
    let start = Instant::now();
    let config = Config::load().unwrap_or_default();

    // A bad group file aborts before any scraping starts.
    let groups = PackageGroups::load(&groups_path)?;

    if let Some(name) = &group_filter {
        if !groups.0.contains_key(name) {
            anyhow::bail!("unknown group: {}", name);
        }
    }

    let cwd = std::env::current_dir()?;
    let mut scraper = Scraper::new(&config.audit_level);
    if no_prune {
        scraper = scraper.without_prune();
    }
    if no_audit {
        scraper = scraper.without_audit();
    }

    let selected: Vec<_> = groups
        .0
        .iter()
        .filter(|(name, _)| group_filter.as_deref().map_or(true, |f| f == name.as_str()))
        .collect();
    let total: usize = selected.iter().map(|(_, projects)| projects.len()).sum();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    // Projects are scraped strictly one at a time: the prune step must
    // finish before the audit for the same project, and version buckets
    // record projects in configuration order.
    let mut scraped: Vec<(String, ScrapedGroup)> = Vec::new();
    let mut failures: Vec<(String, String)> = Vec::new();

    for (group_name, projects) in selected {
        let mut group_reports: ScrapedGroup = Vec::new();

        for entry in projects {
            pb.set_message(format!("Scraping {}...", entry.name));
            let path = entry.resolved_path(&cwd);

            match scraper.scrape(&path).await {
                Ok(report) => {
                    tracing::debug!(
                        project = %entry.name,
                        declared = report.declared_count(),
                        findings = report.finding_count(),
                        "scrape complete"
                    );
                    group_reports.push((entry.name.clone(), report));
                }
                Err(err) => {
                    tracing::error!(project = %entry.name, %err, "scrape failed, skipping project");
                    failures.push((entry.name.clone(), err.to_string()));
                }
            }
            pb.inc(1);
        }

        scraped.push((group_name.clone(), group_reports));
    }
    pb.finish_with_message(format!("Scraped {} projects", total - failures.len()));

    let mut aggregator = Aggregator::new(Box::new(default_lookup(&config)));
    let combined = aggregator.combine(&scraped).await?;

    write_combined(&output_path, &combined)?;
    println!("Combined report written to: {}", output_path.display());
    println!();
    print_summary(&combined);

    if !failures.is_empty() {
        println!();
        println!("{} project(s) failed to scrape:", failures.len());
        for (project, reason) in &failures {
            println!("  {}: {}", project, reason);
        }
    }

    println!();
    println!("Completed in {}ms", start.elapsed().as_millis());

    if failures.is_empty() {
        Ok(exit_codes::SUCCESS)
    } else {
        Ok(exit_codes::PARTIAL)
    }
}

fn list_groups(groups_path: &PathBuf) -> Result<()> {
    let groups = PackageGroups::load(groups_path)?;

    println!(
        "{} group(s), {} project(s):",
        groups.0.len(),
        groups.project_count()
    );
    println!();

    for (name, projects) in &groups.0 {
        println!("  {}", name);
        for entry in projects {
            println!("    {:<20} {}", entry.name, entry.path.display());
        }
        println!();
    }

    Ok(())
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'depmap config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
