mod render;
mod session;

use anyhow::Result;
use clap::Parser;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of a running colloquyd server
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    host: String,

    /// Agent ids to query, comma separated (skips the interactive picker)
    #[arg(short, long, value_delimiter = ',')]
    agents: Vec<String>,

    /// One-shot prompt; omit it to start an interactive session
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut session = session::build_session(cli.host, cli.agents).await?;
    match cli.prompt {
        Some(prompt) => session.headless_start(prompt).await,
        None => session.start().await,
    }
}
