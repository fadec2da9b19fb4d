//! Subcomando `convert`: TSV de classificação (`texto<TAB>rótulo`) para DocBin.
//!
//! Cada linha vira um documento tokenizado pelo tokenizador em branco do
//! inglês, com `cats = {POSITIVE, NEGATIVE}` conforme o rótulo (`"1"` é
//! positivo, qualquer outro valor é negativo).

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use console::style;
use matcher_core::{DocBin, Pipeline};
use tracing::info;

struct Row<'a> {
    text: &'a str,
    positive: bool,
}

/// Separa as linhas do TSV. Só linhas vazias são ignoradas; qualquer outra
/// linha precisa ter exatamente um TAB (texto e rótulo podem ser vazios).
fn parse_rows(content: &str) -> anyhow::Result<Vec<Row<'_>>> {
    let mut rows = Vec::new();
    for (number, line) in content.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(text), Some(label), None) = (fields.next(), fields.next(), fields.next()) else {
            bail!("linha {}: esperado `texto<TAB>rótulo`", number + 1);
        };
        rows.push(Row {
            text,
            positive: label == "1",
        });
    }
    Ok(rows)
}

/// Converte o conteúdo de um TSV numa coleção de documentos.
pub fn convert_tsv(content: &str) -> anyhow::Result<DocBin> {
    let rows = parse_rows(content)?;
    let texts: Vec<&str> = rows.iter().map(|r| r.text).collect();

    let nlp = Pipeline::blank("en");
    let docs = nlp
        .make_docs(&texts)
        .into_iter()
        .zip(&rows)
        .map(|(mut doc, row)| {
            let (positive, negative) = if row.positive { (1.0, 0.0) } else { (0.0, 1.0) };
            doc.set_cat("POSITIVE", positive);
            doc.set_cat("NEGATIVE", negative);
            doc
        });
    Ok(docs.collect())
}

pub fn cmd_convert(input: &Path, output: &Path) -> anyhow::Result<()> {
    let content = fs::read_to_string(input).with_context(|| format!("falha ao ler {}", input.display()))?;
    let db = convert_tsv(&content).with_context(|| format!("arquivo inválido: {}", input.display()))?;
    db.to_disk(output)
        .with_context(|| format!("falha ao gravar {}", output.display()))?;

    info!(input = %input.display(), output = %output.display(), docs = db.len(), "conversão concluída");
    println!(
        "{} {} documentos gravados em {}",
        style("✓").green(),
        db.len(),
        output.display()
    );
    Ok(())
}
