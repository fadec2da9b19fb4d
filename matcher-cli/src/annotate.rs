//! Subcomando `annotate`: roda o pipeline e imprime um objeto JSON por texto.
//!
//! ```json
//! {"text":"I love movies","spans":{"movie":[{"start":2,"end":3,"start_char":7,"end_char":13,"text":"movies"}]}}
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use matcher_core::registry::patterns_from_value;
use matcher_core::{Doc, FactoryRegistry, PatternRegistry, Pipeline, PipelineConfig};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct SpanOut<'a> {
    start: usize,
    end: usize,
    start_char: usize,
    end_char: usize,
    text: &'a str,
}

#[derive(Serialize)]
struct DocOut<'a> {
    text: &'a str,
    spans: BTreeMap<&'a str, Vec<SpanOut<'a>>>,
}

impl<'a> DocOut<'a> {
    fn from_doc(doc: &'a Doc) -> Self {
        let spans = doc
            .spans
            .keys()
            .map(|key| {
                let group = doc
                    .span_group(key)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|span| SpanOut {
                        start: span.start(),
                        end: span.end(),
                        start_char: span.start_char(),
                        end_char: span.end_char(),
                        text: span.text(),
                    })
                    .collect();
                (key, group)
            })
            .collect();
        Self {
            text: doc.text(),
            spans,
        }
    }
}

/// Registro embutido mais os provedores lidos de arquivos `[[{...}], ...]`.
/// Um nome já existente (ex: `example.movie_matches.v1`) é substituído.
fn load_patterns(files: &[(String, PathBuf)]) -> anyhow::Result<PatternRegistry> {
    let mut registry = PatternRegistry::builtin();
    for (name, path) in files {
        let json = fs::read_to_string(path).with_context(|| format!("falha ao ler {}", path.display()))?;
        let value = serde_json::from_str(&json).with_context(|| format!("JSON inválido em {}", path.display()))?;
        let patterns = patterns_from_value(value).with_context(|| format!("padrões inválidos em {}", path.display()))?;
        info!(provider = %name, patterns = patterns.len(), "padrões carregados");
        registry.register_patterns(name.as_str(), patterns);
    }
    Ok(registry)
}

fn load_pipeline(config: Option<&Path>, pattern_files: &[(String, PathBuf)]) -> anyhow::Result<Pipeline> {
    let patterns = load_patterns(pattern_files)?;
    let config = match config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("falha ao ler a configuração {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let nlp = Pipeline::from_config(&config, &patterns, &FactoryRegistry::builtin())
        .context("falha ao montar o pipeline")?;
    Ok(nlp)
}

/// Anota cada texto e escreve uma linha JSON por documento em `out`.
pub fn annotate_texts<I, W>(nlp: &Pipeline, texts: I, out: &mut W) -> anyhow::Result<usize>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    W: Write,
{
    let mut count = 0;
    for doc in nlp.pipe(texts) {
        let doc = doc?;
        serde_json::to_writer(&mut *out, &DocOut::from_doc(&doc))?;
        writeln!(out)?;
        count += 1;
    }
    Ok(count)
}

pub fn cmd_annotate(
    config: Option<&Path>,
    pattern_files: &[(String, PathBuf)],
    texts: &[String],
) -> anyhow::Result<()> {
    let nlp = load_pipeline(config, pattern_files)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let count = if texts.is_empty() {
        let lines = io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .context("falha ao ler a entrada padrão")?;
        annotate_texts(&nlp, lines.iter().filter(|l| !l.trim().is_empty()), &mut out)?
    } else {
        annotate_texts(&nlp, texts, &mut out)?
    };
    out.flush()?;

    info!(docs = count, pipes = ?nlp.pipe_names(), "anotação concluída");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn run(nlp: &Pipeline, texts: &[&str]) -> Vec<Value> {
        let mut out = Vec::new();
        annotate_texts(nlp, texts, &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_default_pipeline_output() {
        let nlp = load_pipeline(None, &[]).unwrap();
        let lines = run(&nlp, &["I love movies and film festivals", "Nothing here"]);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0]["spans"]["movie"],
            json!([
                {"start": 2, "end": 3, "start_char": 7, "end_char": 13, "text": "movies"},
                {"start": 4, "end": 5, "start_char": 18, "end_char": 22, "text": "film"}
            ])
        );
        assert_eq!(lines[1]["spans"]["movie"], json!([]));
    }

    #[test]
    fn test_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nlp.json");
        let config = json!({
            "components": [{
                "name": "awards",
                "factory": "example.movie_matcher.v1",
                "matches": [[{"LOWER": "oscar"}]],
                "span_key": "awards"
            }]
        });
        std::fs::write(&path, config.to_string()).unwrap();

        let nlp = load_pipeline(Some(&path), &[]).unwrap();
        let lines = run(&nlp, &["An Oscar for the film"]);
        assert_eq!(lines[0]["spans"]["awards"][0]["text"], "Oscar");
        assert!(lines[0]["spans"].get("movie").is_none());
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nlp.json");
        std::fs::write(&path, r#"{"components": [{"name": "m", "factory": "nope.v1"}]}"#).unwrap();
        assert!(load_pipeline(Some(&path), &[]).is_err());
    }

    #[test]
    fn test_pattern_file_replaces_builtin_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("awards.json");
        std::fs::write(&path, json!([[{"LOWER": "oscar"}], [{"LOWER": "emmy"}]]).to_string()).unwrap();

        let files = [(matcher_core::MOVIE_MATCHES_V1.to_string(), path)];
        let nlp = load_pipeline(None, &files).unwrap();
        let lines = run(&nlp, &["An Oscar and an Emmy for the film"]);
        let texts: Vec<&Value> = lines[0]["spans"]["movie"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| &s["text"])
            .collect();
        assert_eq!(texts, [&json!("Oscar"), &json!("Emmy")]);
    }

    #[test]
    fn test_invalid_pattern_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"not": "a list"}"#).unwrap();
        assert!(load_patterns(&[("bad.v1".to_string(), path)]).is_err());
    }
}
