use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use policy_weather::apis::llm_json::parse_candidate_list;
use policy_weather::apis::noaa::NoaaSource;
use policy_weather::apis::openai::{OpenAiClient, OpenAiCoverageExtractor, OpenAiSearchSource};
use policy_weather::app::analyze_use_case::encode_image;
use policy_weather::app::{AnalyzePolicyUseCase, SearchWeatherEventsUseCase};
use policy_weather::config::Config;
use policy_weather::domain::{EventType, PolicyDetails, SearchRequest};
use policy_weather::error::SourceError;
use policy_weather::infra::event_store::JsonlEventStore;
use policy_weather::observability::{self, metrics};
use policy_weather::pipeline::{ReconcileResult, Reconciler, SourceOutcome};

#[derive(Parser)]
#[command(name = "policy_weather")]
#[command(about = "Insurance policy coverage extraction and hail/wind event search")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print Prometheus metrics when the command finishes
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search hail and wind events for a location and policy period
    Search {
        #[arg(long)]
        location: String,
        #[arg(long)]
        effective_date: String,
        #[arg(long)]
        expiration_date: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract coverage details from declaration-page images
    Analyze {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Analyze the images, then search events for the extracted policy
    Run {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Reconcile two previously fetched candidate files offline
    Reconcile {
        /// Historical-records candidates (JSON array or {"events": [...]})
        #[arg(long)]
        historical: PathBuf,
        /// Search candidates (JSON array or {"events": [...]})
        #[arg(long)]
        search: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let _log_guard = observability::init_logging();

    if cli.metrics {
        if let Err(e) = metrics::init() {
            warn!("Metrics unavailable: {}", e);
        }
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Search {
            location,
            effective_date,
            expiration_date,
            json,
        } => {
            progress(json, &format!("🔎 Searching weather events for {}...", location));
            let use_case = build_search_use_case(&config)?;
            let request = SearchRequest::new(location, effective_date, expiration_date);
            let result = use_case.execute(&request).await;
            print_events(&result, Some(&request.location), json)?;
        }
        Commands::Analyze { images, json } => {
            progress(json, &format!("🔄 Analyzing {} policy document(s)...", images.len()));
            let details = analyze(&config, &images).await?;
            print_policy(&details, json)?;
        }
        Commands::Run { images, json } => {
            progress(json, &format!("🔄 Analyzing {} policy document(s)...", images.len()));
            let details = analyze(&config, &images).await?;
            if !json {
                print_policy(&details, false)?;
            }

            let weather = match details.search_request() {
                Some(request) => {
                    progress(json, &format!("🔎 Searching weather events for {}...", request.location));
                    let use_case = build_search_use_case(&config)?;
                    let result = use_case.execute(&request).await;
                    if !json {
                        print_events(&result, Some(&request.location), false)?;
                    }
                    Some(result)
                }
                None => {
                    warn!("Policy is missing location or period; skipping weather search");
                    progress(json, "⚠️  Location or policy period not found; weather search skipped");
                    None
                }
            };

            if json {
                let report = RunReport {
                    policy: &details,
                    weather: weather.as_ref(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Commands::Reconcile {
            historical,
            search,
            json,
        } => {
            let historical = read_candidate_file(&historical).await;
            let search = read_candidate_file(&search).await;
            let result = Reconciler::default().reconcile(historical, search);
            print_events(&result, None, json)?;
        }
    }

    if cli.metrics {
        if let Some(rendered) = metrics::render() {
            // stderr, so `--json` output on stdout stays a single document
            eprintln!("\n📊 Metrics:\n{}", rendered);
        }
    }

    Ok(())
}

/// Combined `run --json` document; `weather` is null when no search ran.
#[derive(Serialize)]
struct RunReport<'a> {
    policy: &'a PolicyDetails,
    weather: Option<&'a ReconcileResult>,
}

/// Human-readable progress line, suppressed when stdout carries JSON.
fn progress(json: bool, message: &str) {
    if !json {
        println!("{}", message);
    }
}

fn build_search_use_case(config: &Config) -> anyhow::Result<SearchWeatherEventsUseCase> {
    let historical = Arc::new(NoaaSource::new(config.noaa.clone())?);
    let openai = Arc::new(OpenAiClient::new(config.openai.clone())?);
    let search = Arc::new(OpenAiSearchSource::new(openai));

    let mut use_case = SearchWeatherEventsUseCase::new(historical, search, Reconciler::default())
        .with_source_timeout(config.search.source_timeout())
        .with_store_timeout(config.store.timeout());

    if let Some(path) = &config.store.path {
        info!("Persisting reconciled events to {}", path);
        use_case = use_case.with_store(Arc::new(JsonlEventStore::new(path)));
    }
    Ok(use_case)
}

async fn analyze(config: &Config, paths: &[PathBuf]) -> anyhow::Result<PolicyDetails> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        images.push(encode_image(&bytes));
    }

    let openai = Arc::new(OpenAiClient::new(config.openai.clone())?);
    if !openai.is_configured() {
        anyhow::bail!("OpenAI API key not configured");
    }
    let use_case = AnalyzePolicyUseCase::new(Arc::new(OpenAiCoverageExtractor::new(openai)));
    use_case.analyze(&images).await
}

/// A file that cannot be read or parsed counts as that source failing.
async fn read_candidate_file(path: &Path) -> SourceOutcome {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SourceError::Transport(format!("{}: {}", path.display(), e)))?;
    parse_candidate_list(&content).map_err(|e| SourceError::InvalidResponse(format!("{}: {}", path.display(), e)))
}

fn print_policy(details: &PolicyDetails, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(details)?);
        return Ok(());
    }

    println!("\n📄 Policy Coverage Details:");
    println!("   Coverage A - Dwelling: {}", PolicyDetails::display(&details.coverage_a));
    println!("   Coverage B - Other Structures: {}", PolicyDetails::display(&details.coverage_b));
    println!("   Coverage C - Personal Property: {}", PolicyDetails::display(&details.coverage_c));
    println!("   Coverage D - Loss of Use: {}", PolicyDetails::display(&details.coverage_d));
    println!(
        "   Property Coverage Deductible (All Other Perils): {}",
        PolicyDetails::display(&details.deductible)
    );
    println!(
        "   Windstorm or Hail Deductible: {}",
        PolicyDetails::display(&details.windstorm_deductible)
    );
    println!("   Policy Period: {}", details.policy_period());
    println!("   Location: {}", PolicyDetails::display(&details.location));
    Ok(())
}

fn print_events(result: &ReconcileResult, location: Option<&str>, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("\n🌦️  Weather Events:");
    if let Some(location) = location {
        println!("   Location: {}", location);
    }

    if !result.success {
        println!("   ❌ Weather search could not run (missing location or policy period)");
        return Ok(());
    }
    if result.events.is_empty() {
        println!("   No weather events found for the policy period at this location.");
        return Ok(());
    }

    for event in &result.events {
        let icon = match event.event_type() {
            EventType::Hail => "🌨️",
            EventType::Wind => "💨",
        };
        println!("\n   {} {}", icon, event.date());
        println!("      {}", event.details());
        if let (Some(source), Some(url)) = (event.source(), event.source_url()) {
            println!("      Source: {} ({})", source, url);
        } else if let Some(source) = event.source() {
            println!("      Source: {}", source);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_run_report_is_one_document() {
        let details = PolicyDetails {
            location: Some("123 Main St, Dallas, TX 75201".into()),
            ..Default::default()
        };
        let weather = ReconcileResult { success: true, events: vec![] };

        let report = RunReport {
            policy: &details,
            weather: Some(&weather),
        };
        let rendered = serde_json::to_string_pretty(&report).unwrap();
        let parsed: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(
            parsed,
            json!({
                "policy": {"location": "123 Main St, Dallas, TX 75201"},
                "weather": {"success": true, "events": []}
            })
        );
    }

    #[test]
    fn test_run_report_without_search() {
        let details = PolicyDetails::default();
        let report = RunReport {
            policy: &details,
            weather: None,
        };
        let parsed = serde_json::to_value(&report).unwrap();
        assert_eq!(parsed, json!({"policy": {}, "weather": null}));
    }

    #[test]
    fn test_cli_parses_search_with_json() {
        let cli = Cli::try_parse_from([
            "policy_weather",
            "search",
            "--location",
            "Dallas, TX",
            "--effective-date",
            "04/01/2024",
            "--expiration-date",
            "04/01/2025",
            "--json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Search { json: true, .. }));
        assert!(Cli::try_parse_from(["policy_weather", "bogus"]).is_err());
    }
}
