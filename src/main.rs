//! bolo CLI entry point.

use bolo_lib::cli::{self, Cli};

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    if let Err(e) = cli::execute(cli).await {
        tracing::debug!(category = e.category(), "command failed: {}", e);
        eprintln!("!!! {}", e.user_message());
        std::process::exit(1);
    }
}
