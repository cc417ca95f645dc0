// Contract Guard - Telegram bot entry point

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use contract_guard::models::settings::{AppConfig, LlmSettings};
use contract_guard::services::catalog::CheckCatalog;
use contract_guard::services::checks::{CheckRunner, CheckSelector};
use contract_guard::services::embedding::provider_from_settings;
use contract_guard::services::engine::{AnalysisEngine, SlitherEngine};
use contract_guard::services::orchestrator::{
    LlmDecisionStep, LlmSummarizer, OrchestratorService, SecurityAssistant, ToolDispatcher,
};
use contract_guard::services::remote::{RemoteAdapter, RemoteGateway, TelegramAdapter};
use contract_guard::storage::ConfigService;
use contract_guard::AppError;
use contract_guard_llm::{LlmProvider, OpenAIProvider, ProviderConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "contract-guard", version, about = "Smart-contract security assistant for Telegram")]
struct Cli {
    /// Config file; defaults to <config dir>/contract-guard/config.json
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing(debug_mode: bool) {
    let default_directive = if debug_mode {
        "info,contract_guard=debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn provider_config(llm: &LlmSettings) -> ProviderConfig {
    ProviderConfig {
        api_key: llm.api_key.clone(),
        base_url: llm.base_url.clone(),
        model: llm.model.clone(),
        max_tokens: llm.max_tokens,
        temperature: llm.temperature,
        timeout_secs: llm.timeout_secs,
        ..Default::default()
    }
}

/// Wire the engine, catalog, selector, orchestration loop and Telegram
/// adapter. Also returns the token that stops in-flight runs.
async fn build_gateway(config: &AppConfig) -> anyhow::Result<(RemoteGateway, CancellationToken)> {
    let engine: Arc<dyn AnalysisEngine> =
        Arc::new(SlitherEngine::new(&config.engine).map_err(AppError::from)?);

    let catalog = Arc::new(
        CheckCatalog::load(config.catalog_path.as_deref(), engine.as_ref())
            .await
            .context("failed to load the check catalog")?,
    );
    tracing::info!(checks = catalog.len(), "check catalog loaded");

    let llm: Arc<dyn LlmProvider> =
        Arc::new(OpenAIProvider::new(provider_config(&config.llm)).map_err(AppError::from)?);

    let embedder =
        provider_from_settings(&config.embedding, &config.llm).map_err(AppError::from)?;
    let mut selector = CheckSelector::new(catalog.clone(), embedder).with_top_k(config.selector.top_k);
    if config.selector.llm_refine {
        selector = selector.with_refiner(llm.clone());
    }

    let dispatcher = Arc::new(ToolDispatcher::new(
        Arc::new(selector),
        Arc::new(CheckRunner::new(catalog)),
    ));
    let orchestrator = Arc::new(
        OrchestratorService::new(Arc::new(LlmDecisionStep::new(llm.clone())), dispatcher, engine)
            .with_run_timeout(Duration::from_secs(config.orchestrator.run_timeout_secs)),
    );
    let assistant = Arc::new(SecurityAssistant::new(
        orchestrator,
        Arc::new(LlmSummarizer::new(llm)),
    ));
    let shutdown = assistant.shutdown_token();

    let adapter = TelegramAdapter::new(config.telegram.clone()).map_err(AppError::from)?;
    if let Err(e) = adapter.health_check().await {
        tracing::warn!(error = %e, "telegram health check failed");
    }

    Ok((RemoteGateway::new(Arc::new(adapter), assistant), shutdown))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_service = ConfigService::load(cli.config).context("failed to load configuration")?;
    let config = config_service.effective_config();
    init_tracing(config.debug_mode);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;
    tracing::info!(path = %config_service.path().display(), "configuration loaded");

    let (gateway, runs) = build_gateway(&config).await?;

    let gateway_token = gateway.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            gateway_token.cancel();
        }
    });

    let result = gateway.run().await;
    runs.cancel();
    result.map_err(AppError::from)?;
    Ok(())
}
