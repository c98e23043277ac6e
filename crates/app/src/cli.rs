use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about = "Search a movie catalog and follow trending searches")]
pub struct Cli {
    /// Run a single search for TERM and exit. Without it, each stdin line
    /// replaces the current search term.
    #[arg(long)]
    pub term: Option<String>,
    /// Quiet period before a typed term is searched.
    #[arg(long)]
    pub debounce_ms: Option<u64>,
    #[arg(long, default_value_t = false)]
    pub skip_trending: bool,
}
