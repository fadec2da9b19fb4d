//! # DocBin — coleção binária de documentos
//!
//! Serializa uma coleção de `Doc`s (texto, offsets dos tokens, categorias e
//! grupos de spans) num único arquivo. O texto original é guardado inteiro,
//! então a leitura reconstrói exatamente os mesmos tokens.
//!
//! ## Formato
//!
//! ```text
//! +----------------+---------+------------------------------+
//! | "MDOCBIN\0" x8 | versão  | payload JSON (serde_json)    |
//! +----------------+---------+------------------------------+
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::doc::Doc;
use crate::error::{MatcherError, Result};
use crate::span::SpanGroups;
use crate::tokenizer::{reindex, Token};

const MAGIC: &[u8; 8] = b"MDOCBIN\0";
const VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct Payload {
    docs: Vec<PackedDoc>,
}

#[derive(Serialize, Deserialize)]
struct PackedDoc {
    text: String,
    /// Offsets de byte `(start, end)` de cada token.
    tokens: Vec<(usize, usize)>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    cats: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "SpanGroups::is_empty")]
    spans: SpanGroups,
}

impl PackedDoc {
    fn pack(doc: &Doc) -> Self {
        Self {
            text: doc.text().to_string(),
            tokens: doc.tokens().iter().map(|t| (t.start, t.end)).collect(),
            cats: doc.cats.clone(),
            spans: doc.spans.clone(),
        }
    }

    fn unpack(self, position: usize) -> Result<Doc> {
        let invalid = |message: String| MatcherError::DocBin(format!("documento {position}: {message}"));

        let mut tokens = Vec::with_capacity(self.tokens.len());
        let mut previous_end = 0;
        for (i, &(start, end)) in self.tokens.iter().enumerate() {
            let valid = previous_end <= start
                && start < end
                && end <= self.text.len()
                && self.text.is_char_boundary(start)
                && self.text.is_char_boundary(end);
            if !valid {
                return Err(invalid(format!("offsets inválidos no token {i}: {start}..{end}")));
            }
            tokens.push(Token::new(&self.text[start..end], start, end));
            previous_end = end;
        }
        reindex(&self.text, &mut tokens);

        for (key, spans) in self.spans.iter() {
            if let Some(bad) = spans.iter().find(|s| s.start >= s.end || s.end > tokens.len()) {
                return Err(invalid(format!("span {}..{} fora do documento em '{key}'", bad.start, bad.end)));
            }
        }

        let mut doc = Doc::new(self.text, tokens);
        doc.cats = self.cats;
        doc.spans = self.spans;
        Ok(doc)
    }
}

/// Coleção de documentos serializável.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocBin {
    docs: Vec<Doc>,
}

impl DocBin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, doc: Doc) {
        self.docs.push(doc);
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn docs(&self) -> &[Doc] {
        &self.docs
    }

    pub fn into_docs(self) -> Vec<Doc> {
        self.docs
    }

    /// Anexa os documentos de `other` ao final desta coleção.
    pub fn merge(&mut self, other: DocBin) {
        self.docs.extend(other.docs);
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = Payload {
            docs: self.docs.iter().map(PackedDoc::pack).collect(),
        };
        let mut bytes = Vec::with_capacity(MAGIC.len() + 1);
        bytes.extend_from_slice(MAGIC);
        bytes.push(VERSION);
        serde_json::to_writer(&mut bytes, &payload)?;
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let body = bytes
            .strip_prefix(MAGIC.as_slice())
            .ok_or_else(|| MatcherError::DocBin("cabeçalho ausente".to_string()))?;
        let (&version, body) = body
            .split_first()
            .ok_or_else(|| MatcherError::DocBin("versão ausente".to_string()))?;
        if version != VERSION {
            return Err(MatcherError::DocBin(format!("versão não suportada: {version}")));
        }
        let payload: Payload = serde_json::from_slice(body)?;
        let docs = payload
            .docs
            .into_iter()
            .enumerate()
            .map(|(i, packed)| packed.unpack(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { docs })
    }

    /// Grava a coleção em `path`, criando o diretório pai se preciso.
    pub fn to_disk(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let bytes = self.to_bytes()?;
        fs::write(path, &bytes)?;
        debug!(path = %path.display(), docs = self.len(), bytes = bytes.len(), "DocBin gravado");
        Ok(())
    }

    pub fn from_disk(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl FromIterator<Doc> for DocBin {
    fn from_iter<I: IntoIterator<Item = Doc>>(iter: I) -> Self {
        Self {
            docs: iter.into_iter().collect(),
        }
    }
}

impl Extend<Doc> for DocBin {
    fn extend<I: IntoIterator<Item = Doc>>(&mut self, iter: I) {
        self.docs.extend(iter);
    }
}
