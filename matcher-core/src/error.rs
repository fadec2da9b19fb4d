//! Erros do `matcher-core`.
//!
//! Falhas de validação de padrões acontecem na construção do pipeline
//! (quando os padrões são registrados no matcher), nunca durante a anotação.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MatcherError>;

#[derive(Debug, Error)]
pub enum MatcherError {
    /// Um padrão não passou na validação do matcher.
    #[error("padrão inválido em '{label}' (padrão {pattern}, token {token}): {message}")]
    InvalidPattern {
        label: String,
        pattern: usize,
        token: usize,
        message: String,
    },

    #[error("provedor de padrões desconhecido: {0}")]
    UnknownProvider(String),

    #[error("fábrica de componente desconhecida: {0}")]
    UnknownFactory(String),

    #[error("configuração inválida: {0}")]
    Config(String),

    #[error("span fora do documento: {start}..{end} (documento com {len} tokens)")]
    SpanOutOfRange { start: usize, end: usize, len: usize },

    #[error("arquivo DocBin inválido: {0}")]
    DocBin(String),

    #[error("erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("erro de JSON: {0}")]
    Json(#[from] serde_json::Error),
}
