//! # matcher-core — Matcher de Padrões de Tokens e Anotação de Spans
//!
//! Este crate implementa um pipeline de NLP baseado em regras: o texto é
//! tokenizado, um matcher de padrões sobre atributos de tokens encontra as
//! ocorrências e um componente grava os resultados como grupos de spans no
//! documento. Também inclui o formato `DocBin` para persistir coleções de
//! documentos anotados (ex: corpus de classificação).
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada**: Texto bruto (String).
//! 2.  **Tokenização** ([`tokenizer`]): O texto é dividido em tokens, preservando offsets originais.
//! 3.  **Documento** ([`doc`], [`span`]): Tokens + grupos de spans + categorias.
//! 4.  **Matching** ([`pattern`], [`matcher`]): Padrões JSON compilados e avaliados sobre os tokens.
//! 5.  **Componentes** ([`annotator`], [`pipeline`]): Fábricas nomeadas montadas por configuração,
//!     com padrões vindos do [`registry`].
//! 6.  **Persistência** ([`docbin`]): Coleções de documentos em disco.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use matcher_core::{FactoryRegistry, PatternRegistry, Pipeline, PipelineConfig};
//!
//! // 1. Monta o pipeline padrão (tokenizador + movie_matcher)
//! let nlp = Pipeline::from_config(
//!     &PipelineConfig::default(),
//!     &PatternRegistry::builtin(),
//!     &FactoryRegistry::builtin(),
//! ).unwrap();
//!
//! // 2. Processa o texto
//! let doc = nlp.process("Cinema is where films live").unwrap();
//!
//! // 3. Lê o grupo de spans
//! for span in doc.span_group("movie").unwrap_or_default() {
//!     println!("{} [{}..{}]", span.text(), span.start(), span.end());
//! }
//! ```

pub mod annotator;
pub mod doc;
pub mod docbin;
pub mod error;
pub mod matcher;
pub mod pattern;
pub mod pipeline;
pub mod registry;
pub mod span;
pub mod tokenizer;
pub mod vocab;

pub use annotator::{MovieMatcherConfig, SpanAnnotator, DEFAULT_SPAN_KEY, MATCH_LABEL, MOVIE_MATCHER_V1};
pub use doc::Doc;
pub use docbin::DocBin;
pub use error::{MatcherError, Result};
pub use matcher::{Greedy, Match, MatchEngine, Matcher};
pub use pattern::{Pattern, TokenSpec};
pub use pipeline::{Component, ComponentConfig, FactoryContext, FactoryRegistry, Pipeline, PipelineConfig};
pub use registry::{movie_matches, PatternRegistry, PatternSource, MOVIE_MATCHES_V1};
pub use span::{Span, SpanGroups, SpanRef};
pub use tokenizer::{Token, TokenizerMode};
pub use vocab::{SymbolId, Vocab};
