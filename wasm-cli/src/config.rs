//! Command-line / environment configuration.
//!
//! | Flag            | Env var                          | Default                 |
//! |-----------------|----------------------------------|-------------------------|
//! | `--server, -s`  | `PROXY_WASM_SERVER`              | `localhost:50051`       |
//! | `--wasm-file`   | `PROXY_WASM_DEFAULT_WASM_FILE`   | `example/myproject.wasm`|
//! | `--data-file`   | `PROXY_WASM_DEFAULT_DATA_FILE`   | `data/http_4pkts.json`  |
//!
//! `.env` files are honoured through `dotenvy` before parsing.

use clap::Parser;

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "proxy-wasm-cli", version, about = "Interactive client for the proxy-wasm host")]
pub struct Config {
    /// Server Address:Port
    #[arg(short, long, env = "PROXY_WASM_SERVER", default_value = "localhost:50051")]
    pub server: String,

    /// Default offered for "WASM File" when launching an instance.
    #[arg(long, env = "PROXY_WASM_DEFAULT_WASM_FILE", default_value = "example/myproject.wasm")]
    pub wasm_file: String,

    /// Default offered for "Packets Data Json File" when sending traffic.
    #[arg(long, env = "PROXY_WASM_DEFAULT_DATA_FILE", default_value = "data/http_4pkts.json")]
    pub data_file: String,
}
