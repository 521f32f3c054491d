//! Interactive command-line client for the proxy-wasm host.
//!
//! The host launches, lists, configures and feeds HTTP traffic into
//! sandboxed wasm instances over gRPC. This crate turns operator input into
//! validated requests for it:
//!
//! - [`fields`] / [`collector`]: declarative option lists and the
//!   retry-until-valid prompting loop.
//! - [`packets`] / [`batch`]: packets-file normalisation and batch traffic
//!   request assembly.
//! - [`host`]: the `WasmHost` boundary and its gRPC implementation.
//! - [`commands`] / [`menu`]: the operations and menus the binary exposes.

pub mod batch;
pub mod codes;
pub mod collector;
pub mod commands;
pub mod config;
pub mod console;
pub mod fields;
pub mod host;
pub mod instance_key;
pub mod menu;
pub mod packets;
