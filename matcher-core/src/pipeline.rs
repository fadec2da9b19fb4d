//! # Pipeline — Tokenizador + Componentes
//!
//! O pipeline coordena a tokenização e aplica, em ordem, cada componente
//! registrado ao documento. Componentes são construídos por fábricas
//! nomeadas (ex: `example.movie_matcher.v1`) a partir de uma configuração
//! JSON; tanto as fábricas quanto os provedores de padrões chegam por
//! registros explícitos passados ao construtor.
//!
//! ## Configuração
//!
//! ```json
//! {
//!   "lang": "en",
//!   "tokenizer": "standard",
//!   "components": [
//!     {
//!       "name": "movie_matcher",
//!       "factory": "example.movie_matcher.v1",
//!       "matches": {"@misc": "example.movie_matches.v1"},
//!       "span_key": "movie"
//!     }
//!   ]
//! }
//! ```
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use matcher_core::{FactoryRegistry, PatternRegistry, Pipeline, PipelineConfig};
//!
//! let nlp = Pipeline::from_config(
//!     &PipelineConfig::default(),
//!     &PatternRegistry::builtin(),
//!     &FactoryRegistry::builtin(),
//! ).unwrap();
//!
//! let doc = nlp.process("I love movies and film festivals").unwrap();
//! assert_eq!(doc.span_texts("movie"), Some(vec!["movies", "film"]));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::annotator::{create_movie_matcher_component, MOVIE_MATCHER_V1};
use crate::doc::Doc;
use crate::error::{MatcherError, Result};
use crate::registry::PatternRegistry;
use crate::tokenizer::{tokenize_batch, tokenize_with_mode, TokenizerMode};
use crate::vocab::Vocab;

/// Um passo do pipeline. Recebe o documento, o modifica e o devolve.
pub trait Component {
    fn process(&self, doc: Doc) -> Result<Doc>;
}

/// O que uma fábrica recebe do pipeline que a está construindo.
pub struct FactoryContext<'a> {
    /// Vocabulário compartilhado do pipeline.
    pub vocab: Arc<Vocab>,
    /// Nome da instância do componente no pipeline.
    pub name: &'a str,
    /// Provedores de padrões disponíveis para referências `{"@misc": ...}`.
    pub patterns: &'a PatternRegistry,
}

/// Constrói um componente a partir da sua configuração JSON.
pub type ComponentFactory = fn(&FactoryContext<'_>, &Value) -> Result<Box<dyn Component>>;

/// Registro de fábricas de componentes.
#[derive(Clone, Default)]
pub struct FactoryRegistry {
    factories: BTreeMap<String, ComponentFactory>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registro com as fábricas embutidas (`example.movie_matcher.v1`).
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(MOVIE_MATCHER_V1, create_movie_matcher_component);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: ComponentFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn get(&self, name: &str) -> Result<ComponentFactory> {
        self.factories
            .get(name)
            .copied()
            .ok_or_else(|| MatcherError::UnknownFactory(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Entrada de componente na configuração. Chaves além de `name` e `factory`
/// são repassadas à fábrica.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub name: String,
    pub factory: String,
    #[serde(flatten)]
    pub config: Map<String, Value>,
}

/// Configuração completa de um pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "PipelineConfig::default_lang")]
    pub lang: String,
    #[serde(default)]
    pub tokenizer: TokenizerMode,
    #[serde(default = "PipelineConfig::default_components")]
    pub components: Vec<ComponentConfig>,
}

impl PipelineConfig {
    fn default_lang() -> String {
        "en".to_string()
    }

    fn default_components() -> Vec<ComponentConfig> {
        vec![ComponentConfig {
            name: "movie_matcher".to_string(),
            factory: MOVIE_MATCHER_V1.to_string(),
            config: Map::new(),
        }]
    }

    /// Pipeline sem componentes: só tokenização.
    pub fn blank(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            tokenizer: TokenizerMode::default(),
            components: Vec::new(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lang: Self::default_lang(),
            tokenizer: TokenizerMode::default(),
            components: Self::default_components(),
        }
    }
}

/// O pipeline: vocabulário, tokenizador e componentes em ordem.
///
/// Cada documento é processado até o fim antes do próximo; os componentes
/// não são chamados concorrentemente.
pub struct Pipeline {
    vocab: Arc<Vocab>,
    tokenizer: TokenizerMode,
    components: Vec<(String, Box<dyn Component>)>,
}

impl Pipeline {
    /// Pipeline vazio para o idioma `lang`.
    pub fn blank(lang: impl Into<String>) -> Self {
        Self {
            vocab: Arc::new(Vocab::new(lang)),
            tokenizer: TokenizerMode::default(),
            components: Vec::new(),
        }
    }

    /// Monta o pipeline a partir da configuração, construindo cada componente
    /// pela sua fábrica. Padrões inválidos falham aqui.
    pub fn from_config(
        config: &PipelineConfig,
        patterns: &PatternRegistry,
        factories: &FactoryRegistry,
    ) -> Result<Self> {
        if config.lang.trim().is_empty() {
            return Err(MatcherError::Config("lang não pode ser vazio".to_string()));
        }
        let mut pipeline = Self::blank(config.lang.as_str()).with_tokenizer(config.tokenizer);
        for component in &config.components {
            let factory = factories.get(&component.factory)?;
            let ctx = FactoryContext {
                vocab: Arc::clone(&pipeline.vocab),
                name: &component.name,
                patterns,
            };
            let built = factory(&ctx, &Value::Object(component.config.clone()))?;
            pipeline.add_pipe(component.name.as_str(), built)?;
        }
        info!(lang = %config.lang, pipes = ?pipeline.pipe_names(), "pipeline montado");
        Ok(pipeline)
    }

    pub fn with_tokenizer(mut self, mode: TokenizerMode) -> Self {
        self.tokenizer = mode;
        self
    }

    /// Adiciona um componente ao final do pipeline. Nomes são únicos.
    pub fn add_pipe(&mut self, name: impl Into<String>, component: Box<dyn Component>) -> Result<()> {
        let name = name.into();
        if self.components.iter().any(|(n, _)| *n == name) {
            return Err(MatcherError::Config(format!("componente duplicado: {name}")));
        }
        self.components.push((name, component));
        Ok(())
    }

    pub fn pipe_names(&self) -> Vec<&str> {
        self.components.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn vocab(&self) -> &Arc<Vocab> {
        &self.vocab
    }

    pub fn lang(&self) -> &str {
        self.vocab.lang()
    }

    /// Só tokeniza; nenhum componente é aplicado.
    pub fn make_doc(&self, text: &str) -> Doc {
        Doc::new(text, tokenize_with_mode(text, self.tokenizer))
    }

    /// Tokeniza vários textos em paralelo (a ordem de entrada é preservada).
    pub fn make_docs<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Vec<Doc> {
        tokenize_batch(texts, self.tokenizer)
            .into_iter()
            .zip(texts)
            .map(|(tokens, text)| Doc::new(text.as_ref(), tokens))
            .collect()
    }

    /// Tokeniza e aplica todos os componentes.
    pub fn process(&self, text: &str) -> Result<Doc> {
        self.process_doc(self.make_doc(text))
    }

    /// Aplica os componentes, em ordem, a um documento já tokenizado.
    pub fn process_doc(&self, mut doc: Doc) -> Result<Doc> {
        for (name, component) in &self.components {
            doc = component.process(doc)?;
            debug!(component = %name, tokens = doc.len(), "componente aplicado");
        }
        Ok(doc)
    }

    /// Processa uma sequência de textos, um documento por vez.
    pub fn pipe<'a, I>(&'a self, texts: I) -> impl Iterator<Item = Result<Doc>> + 'a
    where
        I: IntoIterator,
        I::IntoIter: 'a,
        I::Item: AsRef<str>,
    {
        texts.into_iter().map(move |text| self.process(text.as_ref()))
    }
}
