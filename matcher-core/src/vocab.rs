//! # Vocabulário e interning de strings
//!
//! O `Vocab` é o contexto compartilhado entre o pipeline e seus componentes.
//! Rótulos de regras do matcher são internados no `StringStore` e os
//! resultados carregam apenas o `SymbolId`; o texto é recuperado sob demanda.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Identificador de uma string internada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// Tabela bidirecional string <-> id. Ids são atribuídos em ordem de inserção.
#[derive(Debug, Clone, Default)]
pub struct StringStore {
    strings: Vec<String>,
    ids: HashMap<String, SymbolId>,
}

impl StringStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interna `s` e retorna seu id (o mesmo id se já existir).
    pub fn add(&mut self, s: &str) -> SymbolId {
        if let Some(id) = self.ids.get(s) {
            return *id;
        }
        let id = SymbolId(self.strings.len() as u32);
        self.strings.push(s.to_string());
        self.ids.insert(s.to_string(), id);
        id
    }

    pub fn id_of(&self, s: &str) -> Option<SymbolId> {
        self.ids.get(s).copied()
    }

    pub fn get(&self, id: SymbolId) -> Option<&str> {
        self.strings.get(id.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Contexto de vocabulário de um pipeline.
///
/// Compartilhado via `Arc<Vocab>`; o `StringStore` interno fica atrás de um
/// `RwLock` porque componentes internam rótulos durante a construção.
#[derive(Debug)]
pub struct Vocab {
    lang: String,
    strings: RwLock<StringStore>,
}

impl Vocab {
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            strings: RwLock::new(StringStore::new()),
        }
    }

    /// Código do idioma do pipeline dono deste vocabulário (ex: "en").
    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn intern(&self, s: &str) -> SymbolId {
        self.strings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add(s)
    }

    pub fn id_of(&self, s: &str) -> Option<SymbolId> {
        self.strings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .id_of(s)
    }

    pub fn resolve(&self, id: SymbolId) -> Option<String> {
        self.strings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(str::to_string)
    }
}

impl Default for Vocab {
    fn default() -> Self {
        Self::new("en")
    }
}
