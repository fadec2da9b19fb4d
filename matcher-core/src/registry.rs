//! # Registro de Padrões
//!
//! Provedores de padrões nomeados e versionados (ex: `example.movie_matches.v1`).
//! O registro é um valor comum passado para quem monta o pipeline; não há
//! estado global.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{MatcherError, Result};
use crate::pattern::{Pattern, TokenSpec};

/// Nome do provedor padrão de regras de filmes.
pub const MOVIE_MATCHES_V1: &str = "example.movie_matches.v1";

/// Palavras que caracterizam um match de filme (comparadas em minúsculas).
pub const MOVIE_TERMS: &[&str] = &["film", "films", "movie", "movies", "cinema"];

/// Função pura que produz um conjunto de padrões.
pub type PatternProvider = Arc<dyn Fn() -> Vec<Pattern> + Send + Sync>;

/// As regras de match usadas pelo componente de filmes: um único token cujo
/// `LOWER` está em [`MOVIE_TERMS`].
pub fn movie_matches() -> Vec<Pattern> {
    let mut token = TokenSpec::new();
    token.insert("LOWER".to_string(), json!({ "IN": MOVIE_TERMS }));
    vec![Pattern::new(vec![token])]
}

/// Onde um componente busca seus padrões: um provedor registrado
/// (`{"@misc": "example.movie_matches.v1"}`) ou uma lista inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSource {
    Registered {
        #[serde(rename = "@misc")]
        name: String,
    },
    Inline(Vec<Pattern>),
}

impl PatternSource {
    pub fn registered(name: impl Into<String>) -> Self {
        PatternSource::Registered { name: name.into() }
    }

    /// Resolve a fonte em padrões concretos.
    pub fn resolve(&self, registry: &PatternRegistry) -> Result<Vec<Pattern>> {
        match self {
            PatternSource::Registered { name } => registry.get_patterns(name),
            PatternSource::Inline(patterns) => Ok(patterns.clone()),
        }
    }
}

impl Default for PatternSource {
    fn default() -> Self {
        PatternSource::registered(MOVIE_MATCHES_V1)
    }
}

/// Registro de provedores de padrões.
#[derive(Clone, Default)]
pub struct PatternRegistry {
    providers: BTreeMap<String, PatternProvider>,
}

impl PatternRegistry {
    /// Registro vazio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registro com os provedores embutidos (`example.movie_matches.v1`).
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(MOVIE_MATCHES_V1, movie_matches);
        registry
    }

    /// Registra (ou substitui) um provedor.
    pub fn register<F>(&mut self, name: impl Into<String>, provider: F)
    where
        F: Fn() -> Vec<Pattern> + Send + Sync + 'static,
    {
        self.providers.insert(name.into(), Arc::new(provider));
    }

    /// Registra uma lista fixa de padrões (ex: lida de um arquivo JSON).
    pub fn register_patterns(&mut self, name: impl Into<String>, patterns: Vec<Pattern>) {
        self.register(name, move || patterns.clone());
    }

    /// Padrões do provedor `name`.
    pub fn get_patterns(&self, name: &str) -> Result<Vec<Pattern>> {
        self.providers
            .get(name)
            .map(|provider| provider())
            .ok_or_else(|| MatcherError::UnknownProvider(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

impl fmt::Debug for PatternRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Lê padrões de um valor JSON no formato `[[{...}, ...], ...]`.
pub fn patterns_from_value(value: Value) -> Result<Vec<Pattern>> {
    Ok(serde_json::from_value(value)?)
}
