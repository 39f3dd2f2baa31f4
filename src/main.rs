use clap::Parser;
use creative_insights::config::AppConfig;
use creative_insights::error::InsightsResult;
use creative_insights::genai::AzureOpenAiClient;
use creative_insights::logger::{self, LogLevel};
use creative_insights::meta::{MetaAdsWithImagesService, MetaApiClient};
use creative_insights::pipeline::{ContextKey, ContextValue, PipelineContext};
use serde_json::Value;
use std::process;
use std::sync::Arc;

/// Analyze the creatives of a Meta ad account
#[derive(Parser, Debug)]
#[command(name = "creative-insights", version)]
struct Cli {
    /// Meta ad account id, e.g. act_123456
    #[arg(long, env = "META_ACCOUNT_ID")]
    account_id: String,

    /// Meta Graph API access token
    #[arg(long, env = "META_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Creator whose knowledge should ground the recommendations
    #[arg(long)]
    creator_name: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() {
    // Load .env before clap reads env-backed arguments
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = logger::init(cli.log_level) {
        eprintln!("{}", e);
    }

    match run(cli).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            tracing::error!(target: "creative_insights", "Pipeline failed: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> InsightsResult<String> {
    let config = AppConfig::from_env()?;

    let graph = MetaApiClient::new(config.meta.clone())?;
    let provider = Arc::new(MetaAdsWithImagesService::new(graph));
    let invoker = Arc::new(AzureOpenAiClient::new(config.model.clone())?);
    let pipeline = creative_insights::build_insights_pipeline(provider, invoker, &config)?;

    let mut initial = PipelineContext::new()
        .with_text(ContextKey::AccountId, cli.account_id)?
        .with_text(ContextKey::AccessToken, cli.access_token)?;
    initial = match cli.creator_name {
        Some(name) => initial.with_text(ContextKey::CreatorName, name)?,
        None => initial.with_value(ContextKey::CreatorName, ContextValue::Null)?,
    };

    let run = pipeline.execute_with_report(initial).await?;
    if let Some(slowest) = run.report.slowest_step() {
        tracing::info!(
            target: "creative_insights",
            "Slowest step: {} ({:.2}s)",
            slowest.step_name,
            slowest.duration.as_secs_f64()
        );
    }

    let mut output = serde_json::to_value(&run.context)?;
    if let Some(token) = output.get_mut(ContextKey::AccessToken.as_str()) {
        *token = Value::String("[redacted]".to_string());
    }
    Ok(serde_json::to_string_pretty(&output)?)
}
