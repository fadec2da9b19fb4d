//! # Spans e grupos de spans
//!
//! Um span é um intervalo semiaberto `[start, end)` de tokens de um documento.
//! O documento guarda apenas os índices ([`SpanRef`]); o texto é obtido pela
//! visão emprestada [`Span`], que aponta para os tokens do próprio `Doc`.
//!
//! Grupos de spans ficam num mapa nomeado ([`SpanGroups`]): cada chave
//! (ex: `"movie"`) aponta para uma lista ordenada de spans.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::doc::Doc;
use crate::tokenizer::Token;

/// Intervalo de tokens armazenado num grupo de spans.
///
/// # Exemplo
/// Em "I love movies", o span "movies":
/// `SpanRef { start: 2, end: 3, label: "" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanRef {
    /// Índice do token inicial (inclusivo)
    pub start: usize,
    /// Índice do token final (exclusivo)
    pub end: usize,
    /// Rótulo opcional do span (vazio quando não há rótulo)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
}

impl SpanRef {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            label: String::new(),
        }
    }

    pub fn with_label(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    /// Número de tokens cobertos.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &SpanRef) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Visão de um span sobre o documento dono. Não copia tokens nem texto.
#[derive(Debug, Clone, Copy)]
pub struct Span<'d> {
    doc: &'d Doc,
    start: usize,
    end: usize,
    label: &'d str,
}

impl<'d> Span<'d> {
    /// Chamado por `Doc`, que já validou o intervalo.
    pub(crate) fn new(doc: &'d Doc, start: usize, end: usize, label: &'d str) -> Self {
        Self {
            doc,
            start,
            end,
            label,
        }
    }

    pub fn doc(&self) -> &'d Doc {
        self.doc
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn label(&self) -> &'d str {
        self.label
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn tokens(&self) -> &'d [Token] {
        &self.doc.tokens()[self.start..self.end]
    }

    /// Offset de byte inicial no texto do documento.
    pub fn start_char(&self) -> usize {
        self.tokens().first().map_or(0, |t| t.start)
    }

    /// Offset de byte final no texto do documento.
    pub fn end_char(&self) -> usize {
        self.tokens().last().map_or(0, |t| t.end)
    }

    /// Texto original coberto pelo span, incluindo espaços internos.
    pub fn text(&self) -> &'d str {
        if self.is_empty() {
            return "";
        }
        &self.doc.text()[self.start_char()..self.end_char()]
    }

    pub fn to_ref(&self) -> SpanRef {
        SpanRef::with_label(self.start, self.end, self.label)
    }
}

impl PartialEq for Span<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc)
            && self.start == other.start
            && self.end == other.end
            && self.label == other.label
    }
}

/// Mapa nomeado de grupos de spans de um documento.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanGroups {
    groups: BTreeMap<String, Vec<SpanRef>>,
}

impl SpanGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitui o grupo em `key`, retornando o valor anterior (se havia).
    pub fn insert(&mut self, key: impl Into<String>, spans: Vec<SpanRef>) -> Option<Vec<SpanRef>> {
        self.groups.insert(key.into(), spans)
    }

    pub fn get(&self, key: &str) -> Option<&[SpanRef]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<SpanRef>> {
        self.groups.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.groups.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SpanRef])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_groups_overwrite() {
        let mut groups = SpanGroups::new();
        assert!(groups.insert("movie", vec![SpanRef::new(0, 1)]).is_none());
        let previous = groups.insert("movie", vec![SpanRef::new(2, 3), SpanRef::new(4, 5)]);
        assert_eq!(previous, Some(vec![SpanRef::new(0, 1)]));
        assert_eq!(groups.get("movie").map(<[SpanRef]>::len), Some(2));
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_span_ref_overlap() {
        let a = SpanRef::new(0, 2);
        assert!(a.overlaps(&SpanRef::new(1, 3)));
        assert!(!a.overlaps(&SpanRef::new(2, 3)));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_label_is_not_serialized_when_empty() {
        let json = serde_json::to_string(&SpanRef::new(1, 2)).unwrap();
        assert_eq!(json, r#"{"start":1,"end":2}"#);
    }
}
