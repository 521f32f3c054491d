//! Compiled protobuf / gRPC types for the proxy-wasm host management API.
//!
//! The client stub and messages are generated at build time from
//! `protos/wasm_host.proto` in the workspace root.

/// gRPC types and client stub for the `proxy_wasm_cli.WasmHost` service.
pub mod wasm_host {
    tonic::include_proto!("proxy_wasm_cli");
}
