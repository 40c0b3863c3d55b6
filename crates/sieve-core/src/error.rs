use sieve_broker::ControllerError;
use sieve_corpus::CorpusError;
use sieve_model::ModelError;
use sieve_signal::CollectError;

/// Failures that abort a generation session.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("broker lifecycle: {0}")]
    Broker(#[from] ControllerError),

    #[error("log collection: {0}")]
    Collect(#[from] CollectError),

    #[error("model: {0}")]
    Model(#[from] ModelError),

    #[error("corpus: {0}")]
    Corpus(#[from] CorpusError),
}
