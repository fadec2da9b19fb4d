//! Linha de comando `matcher`: conversão de dados, verificação do ambiente e
//! anotação de textos com o pipeline de spans.

mod annotate;
mod cli;
mod convert;
mod probe;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs vão para stderr; stdout fica livre para a saída dos comandos.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    Cli::parse().run().await
}
