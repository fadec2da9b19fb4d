//! # Documento
//!
//! O `Doc` é o que flui pelo pipeline: o texto original, a sequência de
//! tokens (imutável depois da tokenização), o mapa de grupos de spans e as
//! categorias do documento (usadas em classificação de texto).

use std::collections::BTreeMap;
use std::ops::Index;

use serde::Serialize;

use crate::error::{MatcherError, Result};
use crate::span::{Span, SpanGroups, SpanRef};
use crate::tokenizer::Token;

/// Só serializa: documentos lidos de fora passam pelo [`DocBin`](crate::DocBin),
/// que valida os offsets dos tokens antes de montar o `Doc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Doc {
    text: String,
    tokens: Vec<Token>,
    /// Grupos de spans nomeados (ex: `spans["movie"]`).
    pub spans: SpanGroups,
    /// Pontuação por categoria (ex: `{"POSITIVE": 1.0, "NEGATIVE": 0.0}`).
    pub cats: BTreeMap<String, f64>,
}

impl Doc {
    pub fn new(text: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            text: text.into(),
            tokens,
            spans: SpanGroups::new(),
            cats: BTreeMap::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Visão do intervalo `[start, end)`. Falha se o intervalo for vazio,
    /// invertido ou passar do fim do documento.
    pub fn span(&self, start: usize, end: usize) -> Result<Span<'_>> {
        if start >= end || end > self.tokens.len() {
            return Err(MatcherError::SpanOutOfRange {
                start,
                end,
                len: self.tokens.len(),
            });
        }
        Ok(Span::new(self, start, end, ""))
    }

    /// Materializa o grupo `key` como visões sobre este documento.
    ///
    /// Retorna `None` se o grupo não existe. Spans fora do documento (ex: um
    /// `SpanRef` inserido à mão) são descartados.
    pub fn span_group(&self, key: &str) -> Option<Vec<Span<'_>>> {
        let refs = self.spans.get(key)?;
        Some(
            refs.iter()
                .filter(|r| r.start < r.end && r.end <= self.tokens.len())
                .map(|r| Span::new(self, r.start, r.end, &r.label))
                .collect(),
        )
    }

    /// Textos dos spans do grupo `key` (atalho para testes e saída da CLI).
    pub fn span_texts(&self, key: &str) -> Option<Vec<&str>> {
        self.span_group(key)
            .map(|spans| spans.iter().map(|s| s.text()).collect())
    }

    /// Define uma categoria do documento.
    pub fn set_cat(&mut self, label: impl Into<String>, score: f64) {
        self.cats.insert(label.into(), score);
    }

    /// Substitui o grupo `key`. Os intervalos não são validados aqui.
    pub fn set_span_group(&mut self, key: impl Into<String>, spans: Vec<SpanRef>) -> Option<Vec<SpanRef>> {
        self.spans.insert(key, spans)
    }
}

impl Index<usize> for Doc {
    type Output = Token;

    fn index(&self, index: usize) -> &Self::Output {
        &self.tokens[index]
    }
}
