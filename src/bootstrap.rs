//! Composition root: builds the adapters, handlers and orchestrator from
//! an [`AppConfig`].

use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::adapters::ai::{HashingEmbedder, MockLlmGateway, OpenAiConfig, OpenAiEmbedder, OpenAiGateway};
use crate::adapters::retrieval::InMemoryRetriever;
use crate::adapters::storage::build_session_store;
use crate::application::handlers::{DefaultChatHandler, EmailHandler, QuizHandler, RiskAnalyzer, RiskManagingHandler};
use crate::application::handlers::quiz::quiz_validation_chain;
use crate::application::{Dispatcher, HandlerRegistry, IntentClassifier, SimilarityIndex, TurnOrchestrator};
use crate::config::{
    AgentsConfig, AiConfig, AppConfig, LogFormat, RetrievalConfig, RoutingConfig, ServerConfig,
};
use crate::domain::readiness::ReadinessPolicy;
use crate::domain::validation::LoopLimits;
use crate::ports::{DocumentRetriever, Embedder, LlmError, LlmGateway, RetrieverError};

/// Library modules that log too much at `info`.
const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "tower_http"];

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("failed to build AI client: {0}")]
    AiClient(#[from] LlmError),

    #[error("failed to load reference corpus: {0}")]
    Corpus(#[from] RetrieverError),
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut directives = server.log_level.clone();
        for module in NOISY_MODULES {
            directives.push_str(&format!(",{}=warn", module));
        }
        EnvFilter::new(directives)
    });

    let registry = tracing_subscriber::registry().with(filter);
    if server.log_format() == LogFormat::Json {
        let _ = registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init();
    } else {
        let _ = registry.with(tracing_subscriber::fmt::layer()).try_init();
    }
}

/// Chat gateway for the configured endpoint, or an offline stand-in
/// that fails every call so handlers take their fallbacks.
pub fn build_gateway(ai: &AiConfig) -> Result<Arc<dyn LlmGateway>, BootstrapError> {
    match ai.api_key() {
        Some(key) => {
            let gateway = OpenAiGateway::new(openai_config(ai, key, &ai.model))?;
            tracing::info!(model = %ai.model, base_url = %ai.base_url, "using OpenAI-compatible gateway");
            Ok(Arc::new(gateway))
        }
        None => {
            tracing::warn!("no AI API key configured; model calls will use offline fallbacks");
            Ok(Arc::new(MockLlmGateway::failing(LlmError::unavailable(
                "no API key configured",
            ))))
        }
    }
}

/// Remote embedder when a key is configured, else the local hashing embedder.
pub fn build_embedder(ai: &AiConfig) -> Result<Arc<dyn Embedder>, BootstrapError> {
    match ai.api_key() {
        Some(key) => {
            let embedder = OpenAiEmbedder::new(openai_config(ai, key, &ai.embedding_model))?;
            Ok(Arc::new(embedder))
        }
        None => Ok(Arc::new(HashingEmbedder::new())),
    }
}

fn openai_config(ai: &AiConfig, key: &str, model: &str) -> OpenAiConfig {
    OpenAiConfig::new(key)
        .with_model(model)
        .with_base_url(ai.base_url.clone())
        .with_timeout(ai.timeout())
        .with_max_attempts(ai.max_attempts)
}

pub async fn build_retriever(
    retrieval: &RetrievalConfig,
    embedder: Arc<dyn Embedder>,
) -> Result<Arc<dyn DocumentRetriever>, BootstrapError> {
    match &retrieval.corpus_path {
        Some(path) => Ok(Arc::new(InMemoryRetriever::from_path(path, embedder).await?)),
        None => {
            tracing::warn!("no reference corpus configured; searches return nothing");
            Ok(Arc::new(InMemoryRetriever::empty(embedder)))
        }
    }
}

/// Built-in handlers in routing priority order, default chat last.
pub fn build_registry(
    agents: &AgentsConfig,
    gateway: Arc<dyn LlmGateway>,
    retriever: Arc<dyn DocumentRetriever>,
) -> HandlerRegistry {
    let risk = RiskManagingHandler::new(
        gateway.clone(),
        retriever.clone(),
        ReadinessPolicy::trade_risk(agents.readiness_threshold),
    )
    .with_analyzer(RiskAnalyzer::new(gateway.clone(), retriever.clone(), agents.risk_search_k));

    let quiz = QuizHandler::new(gateway.clone(), retriever.clone())
        .with_limits(
            LoopLimits::new(agents.quiz_question_count, agents.quiz_max_attempts)
                .with_max_substitutions(agents.quiz_max_substitutions),
        )
        .with_validator(quiz_validation_chain(retriever.clone(), agents.reference_max_distance));

    let email = EmailHandler::new(gateway.clone(), retriever);

    HandlerRegistry::new(Arc::new(DefaultChatHandler::new(gateway)))
        .register(Arc::new(risk))
        .register(Arc::new(quiz))
        .register(Arc::new(email))
}

/// Attaches the optional semantic and classifier steps.
pub async fn build_dispatcher(
    routing: &RoutingConfig,
    registry: HandlerRegistry,
    gateway: Arc<dyn LlmGateway>,
    embedder: Arc<dyn Embedder>,
) -> Dispatcher {
    let similarity = if routing.semantic_enabled {
        match SimilarityIndex::build(embedder, &registry, routing.similarity_threshold).await {
            Ok(index) => Some(index),
            Err(e) => {
                tracing::warn!(error = %e, "semantic routing disabled: reference phrases could not be embedded");
                None
            }
        }
    } else {
        None
    };

    let mut dispatcher = Dispatcher::new(registry);
    if let Some(index) = similarity {
        dispatcher = dispatcher.with_similarity(index);
    }
    if routing.classifier_enabled {
        dispatcher = dispatcher.with_classifier(IntentClassifier::new(gateway));
    }
    dispatcher
}

/// Wires every component described by `config`.
pub async fn build_orchestrator(config: &AppConfig) -> Result<TurnOrchestrator, BootstrapError> {
    let gateway = build_gateway(&config.ai)?;
    let embedder = build_embedder(&config.ai)?;
    let retriever = build_retriever(&config.retrieval, embedder.clone()).await?;
    let store = build_session_store(&config.redis, &config.session).await;

    let registry = build_registry(&config.agents, gateway.clone(), retriever);
    let dispatcher = build_dispatcher(&config.routing, registry, gateway, embedder).await;

    Ok(TurnOrchestrator::new(store, Arc::new(dispatcher)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::TurnCommand;
    use crate::domain::response::EnvelopeKind;
    use std::io::Write;

    #[tokio::test]
    async fn offline_configuration_builds_all_handlers() {
        let orchestrator = build_orchestrator(&AppConfig::default()).await.unwrap();
        let ids: Vec<String> = orchestrator
            .dispatcher()
            .registry()
            .ids()
            .iter()
            .map(|id| id.to_string())
            .collect();
        assert_eq!(ids, vec!["riskmanaging", "quiz", "email", "default_chat"]);
    }

    #[tokio::test]
    async fn offline_gateway_degrades_to_fallback_reply() {
        let mut config = AppConfig::default();
        config.routing.semantic_enabled = false;
        let orchestrator = build_orchestrator(&config).await.unwrap();

        let outcome = orchestrator
            .handle_turn(TurnCommand::new("good morning"))
            .await
            .unwrap();
        assert_eq!(outcome.handler.as_str(), "default_chat");
        assert_eq!(outcome.envelope.kind, EnvelopeKind::Chat);
        assert!(!outcome.envelope.message.is_empty());
    }

    #[tokio::test]
    async fn corpus_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "documents:\n  - content: \"FOB: risk passes on board.\"\n    metadata:\n      document_type: trade_terminology"
        )
        .unwrap();
        let retrieval = RetrievalConfig {
            corpus_path: Some(file.path().to_path_buf()),
        };

        let retriever = build_retriever(&retrieval, Arc::new(HashingEmbedder::new()))
            .await
            .unwrap();
        let hits = retriever.search("FOB", 3, None).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn bundled_sample_corpus_parses() {
        let retrieval = RetrievalConfig {
            corpus_path: Some(concat!(env!("CARGO_MANIFEST_DIR"), "/data/corpus.yaml").into()),
        };
        let retriever = build_retriever(&retrieval, Arc::new(HashingEmbedder::new()))
            .await
            .unwrap();
        let mistakes = retriever
            .search("FOB port", 5, Some("common_mistake"))
            .await
            .unwrap();
        assert_eq!(mistakes.len(), 2);
    }

    #[tokio::test]
    async fn missing_corpus_file_is_an_error() {
        let retrieval = RetrievalConfig {
            corpus_path: Some("/nonexistent/corpus.yaml".into()),
        };
        let result = build_retriever(&retrieval, Arc::new(HashingEmbedder::new())).await;
        assert!(matches!(result, Err(BootstrapError::Corpus(_))));
    }
}
