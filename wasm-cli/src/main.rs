//! proxy-wasm-cli entry point.
//!
//! Connects (lazily) to the proxy-wasm host and runs the interactive menus.
//! See [`proxy_wasm_cli::config`] for flags and environment variables.
//! Logs go to stderr as JSON; set `RUST_LOG` to change the filter.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use proxy_wasm_cli::config::Config;
use proxy_wasm_cli::console::Console;
use proxy_wasm_cli::host::GrpcWasmHost;
use proxy_wasm_cli::menu::{self, DialoguerChooser};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("proxy_wasm_cli=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = Config::parse();
    let host = GrpcWasmHost::connect_lazy(&config.server)?;

    println!("Using Server {}", config.server);
    info!(server = %config.server, "channel configured");

    let mut console = Console::stdio();
    menu::run(&host, &mut console, &mut DialoguerChooser, &config).await
}
