use aggregate_cli::cli;
use aggregate_cli::constants::SUPPORT_URL;
use aggregate_cli::core::user_friendly_error;
use clap::Parser;
use colored::Colorize;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    cli.init_logging();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute().await {
        let error_ctx = user_friendly_error(e);
        error_ctx.display();
        eprintln!();
        eprintln!("{} {}", "Need help? Ask at".dimmed(), SUPPORT_URL);
        std::process::exit(1);
    }
}
