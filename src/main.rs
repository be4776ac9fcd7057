//! Searchlens CLI
//!
//! Command-line interface for search analytics:
//! - Run an analysis and print the summary
//! - Export a window's search log as CSV
//! - Serve the REST API
//! - Record a search event
//! - Generate a default config file

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use searchlens::analytics::{
    export_filename, write_csv, AnalysisReport, AnalyticsController, ComparedMetric, Engagement,
    QueryCount,
};
use searchlens::api::{serve, AppState};
use searchlens::config::{generate_default_config, Config};
use searchlens::logging;
use searchlens::store::{SearchEvent, SearchLogStore, TypesenseClient};

#[derive(Parser)]
#[command(name = "searchlens")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search analytics over a Typesense search log")]
#[command(long_about = "Searchlens reads the search-event log from Typesense, computes engagement metrics\nfor a window of days, and compares them with the window before it.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: searched in the usual locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one analysis and print the result
    Analyze {
        /// Window length in days (presets: 1, 7, 30, 90)
        #[arg(short, long)]
        days: Option<u32>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Export the window's search events as CSV
    Export {
        /// Window length in days
        #[arg(short, long)]
        days: Option<u32>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the REST API server
    Serve,

    /// Record one search event
    Log {
        /// Query text
        #[arg(short, long)]
        query: String,
        /// Number of results the search returned
        #[arg(short, long)]
        results: u32,
        /// Active filter tab
        #[arg(short, long, default_value = "all")]
        filter: String,
        /// Clicked result, if any
        #[arg(long)]
        clicked: Option<String>,
        /// Session ID
        #[arg(short, long, default_value = "cli")]
        session: String,
        /// Search latency in milliseconds
        #[arg(short, long)]
        latency: Option<u64>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let config = generate_default_config();
        match output {
            Some(path) => {
                // Create parent directory if needed
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, &config)?;
                println!("Config written to {:?}", path);
            }
            None => {
                print!("{}", config);
            }
        }
        return Ok(());
    }

    let config = Config::resolve(cli.config.as_deref())?;
    logging::init(&config.logging)?;
    config.validate()?;

    match cli.command {
        Commands::Analyze { days, format } => {
            let controller = AnalyticsController::from_config(&config)?;
            let days = days.unwrap_or(config.analytics.default_window_days);
            let report = controller.run_analysis(days).await?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Table => print_report(&report),
            }
        }

        Commands::Export { days, output } => {
            let controller = AnalyticsController::from_config(&config)?;
            let days = days.unwrap_or(config.analytics.default_window_days);
            let rows = controller.export(days).await?;

            match output {
                Some(path) => {
                    let path = if path.is_dir() {
                        path.join(export_filename(controller.zone().today(Utc::now())))
                    } else {
                        path
                    };
                    write_csv(&rows, std::fs::File::create(&path)?)?;
                    eprintln!("Exported {} rows to {:?}", rows.len(), path);
                }
                None => {
                    write_csv(&rows, std::io::stdout().lock())?;
                }
            }
        }

        Commands::Serve => {
            tracing::info!("Starting Searchlens API server v{}", env!("CARGO_PKG_VERSION"));
            let controller = Arc::new(AnalyticsController::from_config(&config)?);

            match controller.store().health_check().await {
                Ok(()) => tracing::info!("Search store connection verified"),
                Err(e) => tracing::warn!("Search store not reachable yet: {}", e),
            }

            let state = AppState::new(controller, config.analytics.default_window_days);
            serve(state, &config.api).await?;
        }

        Commands::Log {
            query,
            results,
            filter,
            clicked,
            session,
            latency,
        } => {
            let store = TypesenseClient::new(config.store.clone())?;

            let mut event = SearchEvent::new(query, results, Utc::now().timestamp())
                .id(uuid::Uuid::new_v4().to_string())
                .filter(filter)
                .session(session)
                .user_agent(format!("searchlens-cli/{}", env!("CARGO_PKG_VERSION")));
            if let Some(clicked) = clicked {
                event = event.clicked(clicked);
            }
            if let Some(latency) = latency {
                event = event.latency(latency);
            }

            store.record_event(&event).await?;
            println!("Logged search {:?} ({} results) as {}", event.query, results, event.id);
        }

        Commands::Config { .. } => {}
    }

    Ok(())
}

fn print_report(report: &AnalysisReport) {
    let current = &report.current;
    let metrics = &current.snapshot.metrics;

    println!("Search analytics: last {} days", report.window_days);
    if current.truncated {
        println!("(limited to the newest {} searches)", current.records);
    }
    println!();

    println!("{:<22} {:>12} {:>10}", "Metric", "Value", "Change");
    println!("{}", "-".repeat(46));

    let change = |metric: ComparedMetric| match report.deltas.as_ref().and_then(|d| d.get(metric)) {
        Some(delta) => format!("{:+.1}%", delta.delta),
        None => "-".to_string(),
    };

    println!(
        "{:<22} {:>12} {:>10}",
        "Total searches",
        metrics.total_searches,
        change(ComparedMetric::TotalSearches)
    );
    println!("{:<22} {:>12}", "Unique queries", metrics.unique_queries);
    println!(
        "{:<22} {:>12.1}",
        "Avg results/search", metrics.avg_results_per_search
    );
    println!(
        "{:<22} {:>11.1}% {:>10}",
        "Click-through rate",
        metrics.click_through_rate,
        change(ComparedMetric::ClickThroughRate)
    );
    println!(
        "{:<22} {:>10.0}ms {:>10}",
        "Avg latency",
        metrics.avg_latency,
        change(ComparedMetric::AvgLatency)
    );
    println!(
        "{:<22} {:>12} {:>10}",
        "Zero-result searches",
        metrics.zero_result_searches,
        change(ComparedMetric::ZeroResultCount)
    );

    println!();
    match metrics.engagement {
        Engagement::Good => println!("Engagement: good"),
        Engagement::NeedsImprovement => println!("Engagement: needs improvement"),
    }
    if report.comparison.is_none() {
        println!("Comparison with the previous period is unavailable");
    }

    print_ranked("Top queries", &metrics.top_queries);
    print_ranked("Zero-result queries", &metrics.zero_result_queries);

    if !metrics.insights.is_empty() {
        println!();
        println!("Insights:");
        for insight in &metrics.insights {
            println!("  {}: {}", insight.title(), insight.recommendation());
        }
    }

    if !metrics.filter_usage.is_empty() {
        println!();
        println!("Filter usage:");
        for usage in &metrics.filter_usage {
            println!("  {:<30} {:>6}", usage.filter, usage.count);
        }
    }
}

fn print_ranked(title: &str, queries: &[QueryCount]) {
    println!();
    if queries.is_empty() {
        println!("{}: none", title);
        return;
    }

    println!("{}:", title);
    for (rank, entry) in queries.iter().enumerate() {
        println!("  {:>2}. {:<30} {:>6}", rank + 1, entry.query, entry.count);
    }
}
