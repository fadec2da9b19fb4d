//! Verificação de ferramentas externas via subprocesso.
//!
//! Um [`ToolProbe`] descreve um comando de consulta (ex: `git lfs -v`). A
//! verificação nunca falha: executável ausente ou código de saída diferente
//! de zero viram [`ToolStatus::Missing`].

use std::process::Stdio;

use anyhow::{bail, Context};
use console::style;
use tracing::{info, warn};

const GIT_LFS_URL: &str = "https://git-lfs.github.com/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Found { version: String },
    Missing { reason: String },
}

#[derive(Debug, Clone)]
pub struct ToolProbe {
    pub program: String,
    pub args: Vec<String>,
    /// Prefixo da linha da saída que carrega a versão (ex: `"Version:"`).
    /// Sem ele, a primeira linha não vazia é usada.
    pub version_prefix: Option<&'static str>,
}

impl ToolProbe {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            version_prefix: None,
        }
    }

    /// `git lfs -v`
    pub fn git_lfs() -> Self {
        Self::new("git", ["lfs", "-v"])
    }

    /// `<python> -m pip show <name>`
    pub fn pip_package(python: &str, name: &str) -> Self {
        Self {
            version_prefix: Some("Version:"),
            ..Self::new(python, ["-m", "pip", "show", name])
        }
    }

    pub async fn check(&self) -> ToolStatus {
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return ToolStatus::Missing {
                    reason: format!("{}: {e}", self.program),
                }
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map_or_else(|| output.status.to_string(), str::to_string);
            return ToolStatus::Missing { reason };
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        ToolStatus::Found {
            version: self.extract_version(&stdout),
        }
    }

    fn extract_version(&self, stdout: &str) -> String {
        let mut lines = stdout.lines().map(str::trim);
        let version = match self.version_prefix {
            Some(prefix) => lines.find_map(|l| l.strip_prefix(prefix)),
            None => lines.find(|l| !l.is_empty()),
        };
        version.unwrap_or_default().trim().to_string()
    }
}

pub async fn cmd_git_lfs_installed() {
    match ToolProbe::git_lfs().check().await {
        ToolStatus::Found { version } => {
            println!("{} Git LFS instalado!\n{version}", style("✓").green());
        }
        ToolStatus::Missing { reason } => {
            warn!(%reason, "git lfs indisponível");
            println!(
                "{} Git LFS não instalado. Veja: {GIT_LFS_URL}",
                style("✗").red()
            );
        }
    }
}

pub async fn cmd_download_model(python: &str, name: &str) -> anyhow::Result<()> {
    if let ToolStatus::Found { version } = ToolProbe::pip_package(python, name).check().await {
        println!("{} Modelo {name} já instalado ({version})", style("✓").green());
        return Ok(());
    }

    info!(model = name, python, "baixando modelo");
    let status = tokio::process::Command::new(python)
        .args(["-m", "spacy", "download", name])
        .status()
        .await
        .with_context(|| format!("falha ao executar {python}"))?;

    if !status.success() {
        println!("{} Falha ao baixar o modelo {name}", style("✗").red());
        bail!("download do modelo {name} terminou com {status}");
    }
    println!("{} Modelo {name} instalado", style("✓").green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_executable() {
        let probe = ToolProbe::new("definitely-not-a-real-tool-7f3a", ["--version"]);
        assert!(matches!(probe.check().await, ToolStatus::Missing { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_found_uses_first_line() {
        let probe = ToolProbe::new("sh", ["-c", "printf '\\ngit-lfs/3.4.0 (GitHub)\\nextra\\n'"]);
        assert_eq!(
            probe.check().await,
            ToolStatus::Found {
                version: "git-lfs/3.4.0 (GitHub)".to_string()
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_found_with_version_prefix() {
        let probe = ToolProbe {
            version_prefix: Some("Version:"),
            ..ToolProbe::new("sh", ["-c", "printf 'Name: en_core_web_sm\\nVersion: 3.7.1\\n'"])
        };
        assert_eq!(
            probe.check().await,
            ToolStatus::Found {
                version: "3.7.1".to_string()
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_reports_stderr() {
        let probe = ToolProbe::new("sh", ["-c", "echo 'not installed' >&2; exit 3"]);
        assert_eq!(
            probe.check().await,
            ToolStatus::Missing {
                reason: "not installed".to_string()
            }
        );
    }

    #[test]
    fn test_pip_package_command() {
        let probe = ToolProbe::pip_package("python3", "en_core_web_sm");
        assert_eq!(probe.program, "python3");
        assert_eq!(probe.args, ["-m", "pip", "show", "en_core_web_sm"]);
    }

    #[tokio::test]
    async fn test_download_model_fails_without_python() {
        let result = cmd_download_model("definitely-not-a-python-7f3a", "en_core_web_sm").await;
        assert!(result.is_err());
    }
}
