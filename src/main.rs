use std::net::SocketAddr;

use clap::{
    Parser,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};

use sporlweb::{config, error, server, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Address to listen on (overrides SERVER_ADDRESS)
    #[clap(long)]
    address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = config::load_env() {
        warning!("Cannot load environment file. Err: {}", e);
    }

    let mut config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => error!("Invalid configuration: {}", e),
    };

    if let Some(address) = cli.address {
        config.server_address = address;
    }

    if let Err(e) = server::start_api_server(config).await {
        error!("Server failed: {}", e);
    }
}
