use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use factcheck_core::{
    Config, LiveProviders, TelemetryOptions, init_telemetry, run_fact_check, validate_headline,
};
use tokio::runtime::Runtime;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "factcheck-cli",
    version,
    about = "Fact-check a news headline with a researcher/analyst crew"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Research a headline and print the analyst's verdict.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Headline to fact-check.
    #[arg(long)]
    headline: String,

    /// Override the Gemini model (defaults to FACTCHECK_MODEL or gemini-2.5-flash).
    #[arg(long)]
    model: Option<String>,

    /// Override the sampling temperature (0.0 - 2.0).
    #[arg(long, value_parser = parse_temperature)]
    temperature: Option<f32>,

    /// Print the researcher's report before the verdict.
    #[arg(long, default_value_t = false)]
    show_research: bool,

    /// Print the stage trace after the verdict.
    #[arg(long, default_value_t = false)]
    trace: bool,

    /// Emit the full crew output as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    init_telemetry(TelemetryOptions::default())?;

    let cli = Cli::parse();

    let rt = Runtime::new()?;
    rt.block_on(async move {
        match cli.command {
            Command::Check(args) => check_command(args).await,
        }
    })
}

fn parse_temperature(raw: &str) -> Result<f32, String> {
    match raw.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(format!("expected a finite number, got {raw:?}")),
    }
}

async fn check_command(args: CheckArgs) -> Result<()> {
    validate_headline(&args.headline)?;

    let mut config = Config::from_env()?;
    if let Some(model) = args.model {
        config = config.with_model(model);
    }
    if let Some(temperature) = args.temperature {
        config = config.with_temperature(temperature);
    }

    let agents = config.agents.clone();
    let providers = LiveProviders::new(Arc::new(config));

    info!(headline = %args.headline, "kicking off crew");
    let output = run_fact_check(&args.headline, &providers, &agents).await?;
    info!("crew execution finished");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if args.show_research {
        println!("## Research\n\n{}\n", output.research);
        println!("## Verdict\n");
    }
    println!("{}", output.analysis);

    if args.trace {
        println!("\n{}", output.trace_collector().summary().render_markdown());
    }

    Ok(())
}
