//! # Matcher de Padrões de Tokens
//!
//! Motor de regras que encontra todas as ocorrências de padrões de tokens em
//! um documento. Regras são agrupadas por rótulo: `add("movie_matches", ...)`
//! registra um conjunto de padrões e cada match devolvido carrega o
//! [`SymbolId`] do rótulo (internado no [`Vocab`] do pipeline).
//!
//! ## Ordem dos resultados
//!
//! Os matches saem ordenados por `start`, depois `end`, depois pela ordem de
//! registro do rótulo. Duplicatas (mesmo rótulo e intervalo vindos de padrões
//! diferentes) são removidas.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use std::sync::Arc;
//! use matcher_core::{Doc, Matcher, MatchEngine, Pattern, Vocab};
//! use matcher_core::tokenizer::tokenize;
//!
//! let vocab = Arc::new(Vocab::new("en"));
//! let mut matcher = Matcher::new(vocab);
//! let pattern = Pattern::from_value(serde_json::json!([{"LOWER": "film"}])).unwrap();
//! matcher.add("films", &[pattern], None).unwrap();
//!
//! let text = "A film about a Film";
//! let doc = Doc::new(text, tokenize(text));
//! let matches = matcher.find(&doc).unwrap();
//! assert_eq!(matches.len(), 2);
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::doc::Doc;
use crate::error::Result;
use crate::pattern::{CompiledPattern, Pattern};
use crate::vocab::{SymbolId, Vocab};

/// Um match: rótulo da regra e intervalo semiaberto de tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Match {
    pub label: SymbolId,
    pub start: usize,
    pub end: usize,
}

/// Filtro de sobreposição aplicado aos matches de um rótulo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Greedy {
    /// Mantém o match que começa primeiro (o mais longo em caso de empate).
    First,
    /// Mantém os matches mais longos.
    Longest,
}

/// Contrato do motor de matching consumido pelos componentes do pipeline.
pub trait MatchEngine {
    /// Registra `patterns` sob `label`. Padrões inválidos são rejeitados aqui.
    fn add(&mut self, label: &str, patterns: &[Pattern], greedy: Option<Greedy>) -> Result<()>;

    /// Avalia todas as regras registradas contra `doc`.
    fn find(&self, doc: &Doc) -> Result<Vec<Match>>;

    /// Texto do rótulo de um match.
    fn label_of(&self, m: &Match) -> Option<String>;
}

struct Rule {
    label: SymbolId,
    patterns: Vec<CompiledPattern>,
    greedy: Option<Greedy>,
}

/// Matcher baseado em regras sobre atributos de tokens.
pub struct Matcher {
    vocab: Arc<Vocab>,
    rules: Vec<Rule>,
}

impl Matcher {
    pub fn new(vocab: Arc<Vocab>) -> Self {
        Self {
            vocab,
            rules: Vec::new(),
        }
    }

    pub fn vocab(&self) -> &Arc<Vocab> {
        &self.vocab
    }

    /// Número de rótulos registrados.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.vocab
            .id_of(label)
            .is_some_and(|id| self.rules.iter().any(|r| r.label == id))
    }

    /// Remove as regras de `label`. Retorna `false` se o rótulo não existia.
    pub fn remove(&mut self, label: &str) -> bool {
        let Some(id) = self.vocab.id_of(label) else {
            return false;
        };
        let before = self.rules.len();
        self.rules.retain(|r| r.label != id);
        self.rules.len() != before
    }
}

impl MatchEngine for Matcher {
    /// Padrões adicionados a um rótulo existente se somam aos anteriores; o
    /// `greedy` mais recente vale para o rótulo inteiro.
    fn add(&mut self, label: &str, patterns: &[Pattern], greedy: Option<Greedy>) -> Result<()> {
        let compiled = patterns
            .iter()
            .enumerate()
            .map(|(i, p)| CompiledPattern::compile(label, i, p))
            .collect::<Result<Vec<_>>>()?;

        let id = self.vocab.intern(label);
        match self.rules.iter_mut().find(|r| r.label == id) {
            Some(rule) => {
                rule.patterns.extend(compiled);
                rule.greedy = greedy;
            }
            None => self.rules.push(Rule {
                label: id,
                patterns: compiled,
                greedy,
            }),
        }
        debug!(label, patterns = patterns.len(), "regras registradas no matcher");
        Ok(())
    }

    fn find(&self, doc: &Doc) -> Result<Vec<Match>> {
        let tokens = doc.tokens();
        let mut ranked: Vec<(usize, Match)> = Vec::new();

        for (rank, rule) in self.rules.iter().enumerate() {
            let mut seen = HashSet::new();
            let mut found = Vec::new();
            for start in 0..tokens.len() {
                for pattern in &rule.patterns {
                    for end in pattern.ends_from(tokens, start) {
                        if seen.insert((start, end)) {
                            found.push(Match {
                                label: rule.label,
                                start,
                                end,
                            });
                        }
                    }
                }
            }
            if let Some(greedy) = rule.greedy {
                found = filter_greedy(found, greedy);
            }
            ranked.extend(found.into_iter().map(|m| (rank, m)));
        }

        ranked.sort_by_key(|(rank, m)| (m.start, m.end, *rank));
        debug!(tokens = tokens.len(), matches = ranked.len(), "matcher aplicado");
        Ok(ranked.into_iter().map(|(_, m)| m).collect())
    }

    fn label_of(&self, m: &Match) -> Option<String> {
        self.vocab.resolve(m.label)
    }
}

/// Remove sobreposições entre matches de um mesmo rótulo.
fn filter_greedy(mut matches: Vec<Match>, greedy: Greedy) -> Vec<Match> {
    match greedy {
        Greedy::First => matches.sort_by_key(|m| (m.start, std::cmp::Reverse(m.end))),
        Greedy::Longest => matches.sort_by_key(|m| (std::cmp::Reverse(m.end - m.start), m.start)),
    }

    let mut kept: Vec<Match> = Vec::new();
    for m in matches {
        if kept.iter().all(|k| m.end <= k.start || k.end <= m.start) {
            kept.push(m);
        }
    }
    kept
}
