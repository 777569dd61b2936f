use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Your question for the assistant
    #[arg()]
    pub query: String,

    /// Run a multi-phase deep research before answering
    #[arg(long)]
    pub research: bool,

    /// Comma-separated tools the assistant may use (default: all)
    #[arg(long, value_delimiter = ',')]
    pub tools: Option<Vec<String>>,

    /// Wait for the complete reply instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Override the server address from the config
    #[arg(long)]
    pub base_url: Option<String>,

    /// Enable debug output
    #[arg(short, long, default_value = "false")]
    pub debug: bool,
}
