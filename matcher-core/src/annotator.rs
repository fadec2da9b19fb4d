//! # Componente de Anotação de Spans (movie matcher)
//!
//! Componente de pipeline que roda o matcher sobre cada documento e grava os
//! matches como um grupo de spans em `doc.spans[span_key]`.
//!
//! ## Fluxo
//!
//! 1. Na construção, os padrões são registrados no motor sob o rótulo fixo
//!    [`MATCH_LABEL`] (uma única vez).
//! 2. Em [`SpanAnnotator::annotate`], o motor devolve triplas `(rótulo, início, fim)`.
//! 3. O rótulo é descartado: há um único conjunto de regras.
//! 4. `doc.spans[span_key]` é **substituído** pela lista de spans, mesmo vazia.
//!
//! Essa substituição é o único efeito colateral do componente.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::doc::Doc;
use crate::error::{MatcherError, Result};
use crate::matcher::{MatchEngine, Matcher};
use crate::pattern::Pattern;
use crate::pipeline::{Component, FactoryContext};
use crate::registry::PatternSource;
use crate::span::SpanRef;
use crate::vocab::Vocab;

/// Nome da fábrica do componente no [`FactoryRegistry`](crate::pipeline::FactoryRegistry).
pub const MOVIE_MATCHER_V1: &str = "example.movie_matcher.v1";

/// Rótulo interno sob o qual os padrões são registrados no matcher.
pub const MATCH_LABEL: &str = "movie_matches";

/// Chave padrão do grupo de spans.
pub const DEFAULT_SPAN_KEY: &str = "movie";

/// Configuração do componente:
/// `{ "matches": {"@misc": "example.movie_matches.v1"}, "span_key": "movie" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieMatcherConfig {
    #[serde(default)]
    pub matches: PatternSource,
    #[serde(default = "MovieMatcherConfig::default_span_key")]
    pub span_key: String,
}

impl MovieMatcherConfig {
    fn default_span_key() -> String {
        DEFAULT_SPAN_KEY.to_string()
    }
}

impl Default for MovieMatcherConfig {
    fn default() -> Self {
        Self {
            matches: PatternSource::default(),
            span_key: Self::default_span_key(),
        }
    }
}

/// Envolve um motor de matching e a chave do grupo de spans de destino.
pub struct SpanAnnotator<E: MatchEngine = Matcher> {
    engine: E,
    span_key: String,
}

impl SpanAnnotator<Matcher> {
    /// Cria o componente com o [`Matcher`] embutido sobre o vocabulário do pipeline.
    pub fn new(vocab: Arc<Vocab>, patterns: &[Pattern], span_key: impl Into<String>) -> Result<Self> {
        Self::with_engine(Matcher::new(vocab), patterns, span_key)
    }
}

impl<E: MatchEngine> SpanAnnotator<E> {
    /// Cria o componente sobre um motor injetado. Falha se `span_key` for
    /// vazio ou se o motor rejeitar algum padrão.
    pub fn with_engine(mut engine: E, patterns: &[Pattern], span_key: impl Into<String>) -> Result<Self> {
        let span_key = span_key.into();
        if span_key.is_empty() {
            return Err(MatcherError::Config("span_key não pode ser vazio".to_string()));
        }
        engine.add(MATCH_LABEL, patterns, None)?;
        Ok(Self { engine, span_key })
    }

    pub fn span_key(&self) -> &str {
        &self.span_key
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Roda o motor sobre `doc` e substitui `doc.spans[span_key]` pelos matches,
    /// na ordem em que o motor os devolve. Erros do motor são propagados sem
    /// alterar o documento.
    pub fn annotate<'d>(&self, doc: &'d mut Doc) -> Result<&'d mut Doc> {
        let matches = self.engine.find(doc)?;
        let spans: Vec<SpanRef> = matches
            .iter()
            .map(|m| SpanRef::new(m.start, m.end))
            .collect();
        debug!(span_key = %self.span_key, spans = spans.len(), "grupo de spans atualizado");
        doc.set_span_group(self.span_key.as_str(), spans);
        Ok(doc)
    }
}

impl<E: MatchEngine> Component for SpanAnnotator<E> {
    fn process(&self, mut doc: Doc) -> Result<Doc> {
        self.annotate(&mut doc)?;
        Ok(doc)
    }
}

/// Fábrica `example.movie_matcher.v1`: resolve os padrões da configuração no
/// registro de padrões do contexto e constrói o componente.
pub fn create_movie_matcher_component(
    ctx: &FactoryContext<'_>,
    config: &serde_json::Value,
) -> Result<Box<dyn Component>> {
    let config: MovieMatcherConfig = serde_json::from_value(config.clone())
        .map_err(|e| MatcherError::Config(format!("componente '{}': {e}", ctx.name)))?;
    let patterns = config.matches.resolve(ctx.patterns)?;
    let component = SpanAnnotator::new(Arc::clone(&ctx.vocab), &patterns, config.span_key)?;
    Ok(Box::new(component))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Match;
    use crate::registry::movie_matches;
    use crate::tokenizer::tokenize;
    use crate::vocab::SymbolId;
    use serde_json::json;

    fn doc(text: &str) -> Doc {
        Doc::new(text, tokenize(text))
    }

    fn movie_annotator(span_key: &str) -> SpanAnnotator {
        SpanAnnotator::new(Arc::new(Vocab::default()), &movie_matches(), span_key).unwrap()
    }

    #[test]
    fn test_annotate_finds_movie_words() {
        let annotator = movie_annotator(DEFAULT_SPAN_KEY);
        let mut d = doc("I love movies and film festivals");
        annotator.annotate(&mut d).unwrap();
        assert_eq!(d.span_texts("movie"), Some(vec!["movies", "film"]));
    }

    #[test]
    fn test_annotate_is_repeatable() {
        let annotator = movie_annotator(DEFAULT_SPAN_KEY);
        let mut d = doc("Cinema is where films live");
        annotator.annotate(&mut d).unwrap();
        let first = d.spans.get("movie").map(<[SpanRef]>::to_vec);
        annotator.annotate(&mut d).unwrap();
        assert_eq!(d.spans.get("movie").map(<[SpanRef]>::to_vec), first);
        assert_eq!(first.map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_no_matches_sets_empty_group() {
        let annotator = movie_annotator(DEFAULT_SPAN_KEY);
        let mut d = doc("Nothing relevant here");
        annotator.annotate(&mut d).unwrap();
        assert_eq!(d.spans.get("movie"), Some(&[][..]));
    }

    #[test]
    fn test_custom_span_key_only() {
        let annotator = movie_annotator("custom");
        let mut d = doc("a movie");
        annotator.annotate(&mut d).unwrap();
        assert_eq!(d.span_texts("custom"), Some(vec!["movie"]));
        assert!(!d.spans.contains_key(DEFAULT_SPAN_KEY));
    }

    #[test]
    fn test_overwrites_previous_group() {
        let annotator = movie_annotator(DEFAULT_SPAN_KEY);
        let mut d = doc("plain text");
        d.set_span_group("movie", vec![SpanRef::new(0, 2)]);
        d.set_span_group("other", vec![SpanRef::new(0, 1)]);
        annotator.annotate(&mut d).unwrap();
        assert_eq!(d.spans.get("movie").map(<[SpanRef]>::len), Some(0));
        assert_eq!(d.spans.get("other").map(<[SpanRef]>::len), Some(1));
    }

    #[test]
    fn test_empty_span_key_rejected() {
        let result = SpanAnnotator::new(Arc::new(Vocab::default()), &movie_matches(), "");
        assert!(matches!(result, Err(MatcherError::Config(_))));
    }

    #[test]
    fn test_invalid_patterns_fail_at_construction() {
        let bad = vec![Pattern::from_value(json!([{"LOWER": {"IN": 5}}])).unwrap()];
        let result = SpanAnnotator::new(Arc::new(Vocab::default()), &bad, "movie");
        assert!(matches!(result, Err(MatcherError::InvalidPattern { .. })));
    }

    /// Motor que devolve intervalos fixos, em ordem arbitrária.
    struct FixedEngine {
        added: Vec<String>,
        matches: Vec<(usize, usize)>,
    }

    impl MatchEngine for FixedEngine {
        fn add(&mut self, label: &str, _patterns: &[Pattern], _greedy: Option<crate::matcher::Greedy>) -> Result<()> {
            self.added.push(label.to_string());
            Ok(())
        }

        fn find(&self, _doc: &Doc) -> Result<Vec<Match>> {
            Ok(self
                .matches
                .iter()
                .map(|&(start, end)| Match { label: SymbolId(0), start, end })
                .collect())
        }

        fn label_of(&self, _m: &Match) -> Option<String> {
            None
        }
    }

    struct FailingEngine;

    impl MatchEngine for FailingEngine {
        fn add(&mut self, _label: &str, _patterns: &[Pattern], _greedy: Option<crate::matcher::Greedy>) -> Result<()> {
            Ok(())
        }

        fn find(&self, _doc: &Doc) -> Result<Vec<Match>> {
            Err(MatcherError::Config("motor indisponível".to_string()))
        }

        fn label_of(&self, _m: &Match) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_injected_engine_order_is_preserved() {
        let engine = FixedEngine { added: vec![], matches: vec![(3, 4), (0, 1)] };
        let annotator = SpanAnnotator::with_engine(engine, &[], "movie").unwrap();
        assert_eq!(annotator.engine().added, [MATCH_LABEL]);

        let mut d = doc("a b c d");
        annotator.annotate(&mut d).unwrap();
        assert_eq!(d.span_texts("movie"), Some(vec!["d", "a"]));
    }

    #[test]
    fn test_engine_failure_propagates_and_keeps_doc() {
        let annotator = SpanAnnotator::with_engine(FailingEngine, &[], "movie").unwrap();
        let mut d = doc("a movie");
        d.set_span_group("movie", vec![SpanRef::new(0, 1)]);
        assert!(annotator.annotate(&mut d).is_err());
        assert_eq!(d.spans.get("movie").map(<[SpanRef]>::len), Some(1));
    }

    #[test]
    fn test_component_returns_same_doc() {
        let annotator = movie_annotator(DEFAULT_SPAN_KEY);
        let d = annotator.process(doc("The film")).unwrap();
        assert_eq!(d.text(), "The film");
        assert_eq!(d.span_texts("movie"), Some(vec!["film"]));
    }

    #[test]
    fn test_config_defaults() {
        let config: MovieMatcherConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, MovieMatcherConfig::default());
        assert_eq!(config.span_key, "movie");
    }
}
