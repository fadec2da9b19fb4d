//! Parser de argumentos e despacho dos subcomandos.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{annotate, convert, probe};

#[derive(Debug, Parser)]
#[command(name = "matcher")]
#[command(about = "Conversão de dados e verificação do ambiente do pipeline de spans")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Converte um arquivo TSV (`texto<TAB>rótulo`) para o formato DocBin
    Convert(ConvertArgs),

    /// Verifica se o Git LFS está instalado
    #[command(alias = "git_lfs_installed")]
    GitLfsInstalled,

    /// Instala um pacote de modelo se ele ainda não estiver instalado
    DownloadModel(DownloadModelArgs),

    /// Roda o pipeline sobre textos e imprime os grupos de spans (JSON lines)
    Annotate(AnnotateArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Arquivo de entrada (.tsv)
    #[arg(value_parser = tsv_file)]
    pub input: PathBuf,

    /// Arquivo de saída (.bin)
    #[arg(value_parser = bin_file)]
    pub output: PathBuf,
}

#[derive(Debug, Args)]
pub struct DownloadModelArgs {
    /// Nome do pacote do modelo (ex: en_core_web_sm)
    pub name: String,

    /// Executável Python usado para consultar e instalar o pacote
    #[arg(long, env = "MATCHER_PYTHON", default_value = "python3")]
    pub python: String,
}

#[derive(Debug, Args)]
pub struct AnnotateArgs {
    /// Configuração do pipeline (JSON); sem ela, usa o pipeline padrão
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Provedor de padrões lido de um arquivo JSON, como `NOME=ARQUIVO`
    /// (ex: `example.movie_matches.v1=padroes.json`); pode se repetir
    #[arg(short, long = "patterns", value_name = "NOME=ARQUIVO", value_parser = pattern_file)]
    pub patterns: Vec<(String, PathBuf)>,

    /// Textos a anotar; sem eles, lê uma linha por texto da entrada padrão
    pub texts: Vec<String>,
}

fn require_suffix(value: &str, suffix: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.extension().and_then(|e| e.to_str()) == Some(suffix) {
        Ok(path)
    } else {
        Err(format!("arquivo .{suffix} obrigatório"))
    }
}

fn pattern_file(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok((name.to_string(), PathBuf::from(path))),
        _ => Err("esperado NOME=ARQUIVO".to_string()),
    }
}

fn tsv_file(value: &str) -> Result<PathBuf, String> {
    require_suffix(value, "tsv")
}

fn bin_file(value: &str) -> Result<PathBuf, String> {
    require_suffix(value, "bin")
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Convert(args) => convert::cmd_convert(&args.input, &args.output),
            Commands::GitLfsInstalled => {
                probe::cmd_git_lfs_installed().await;
                Ok(())
            }
            Commands::DownloadModel(args) => probe::cmd_download_model(&args.python, &args.name).await,
            Commands::Annotate(args) => annotate::cmd_annotate(args.config.as_deref(), &args.patterns, &args.texts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_convert_args() {
        let cli = Cli::try_parse_from(["matcher", "convert", "data/train.tsv", "corpus/train.bin"]).unwrap();
        match cli.command {
            Commands::Convert(args) => {
                assert_eq!(args.input, PathBuf::from("data/train.tsv"));
                assert_eq!(args.output, PathBuf::from("corpus/train.bin"));
            }
            other => panic!("subcomando inesperado: {other:?}"),
        }
    }

    #[test]
    fn test_convert_rejects_wrong_suffix() {
        let err = Cli::try_parse_from(["matcher", "convert", "train.csv", "train.bin"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);

        let err = Cli::try_parse_from(["matcher", "convert", "train.tsv", "train.spacy"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_git_lfs_alias() {
        for name in ["git-lfs-installed", "git_lfs_installed"] {
            let cli = Cli::try_parse_from(["matcher", name]).unwrap();
            assert!(matches!(cli.command, Commands::GitLfsInstalled));
        }
    }

    #[test]
    fn test_download_model_python_flag() {
        let cli = Cli::try_parse_from(["matcher", "download-model", "en_core_web_sm", "--python", "/usr/bin/python3.11"])
            .unwrap();
        match cli.command {
            Commands::DownloadModel(args) => {
                assert_eq!(args.name, "en_core_web_sm");
                assert_eq!(args.python, "/usr/bin/python3.11");
            }
            other => panic!("subcomando inesperado: {other:?}"),
        }
    }

    #[test]
    fn test_annotate_args() {
        let cli = Cli::try_parse_from(["matcher", "annotate", "-c", "nlp.json", "a film", "a movie"]).unwrap();
        match cli.command {
            Commands::Annotate(args) => {
                assert_eq!(args.config, Some(PathBuf::from("nlp.json")));
                assert_eq!(args.texts, ["a film", "a movie"]);
            }
            other => panic!("subcomando inesperado: {other:?}"),
        }
    }

    #[test]
    fn test_annotate_pattern_files() {
        let cli = Cli::try_parse_from([
            "matcher",
            "annotate",
            "--patterns",
            "awards.v1=rules/awards.json",
            "-p",
            "example.movie_matches.v1=movies.json",
            "an Oscar",
        ])
        .unwrap();
        match cli.command {
            Commands::Annotate(args) => {
                assert_eq!(
                    args.patterns,
                    [
                        ("awards.v1".to_string(), PathBuf::from("rules/awards.json")),
                        ("example.movie_matches.v1".to_string(), PathBuf::from("movies.json")),
                    ]
                );
                assert_eq!(args.texts, ["an Oscar"]);
            }
            other => panic!("subcomando inesperado: {other:?}"),
        }

        let err = Cli::try_parse_from(["matcher", "annotate", "--patterns", "awards.json"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }
}
