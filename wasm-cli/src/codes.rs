//! Closed enumerations resolved from operator or packet-file text.
//!
//! Every type accepts a fixed set of lowercase words and maps them to the
//! matching wire enumeration. Text outside the set is an error, never a
//! fallback value.

use std::fmt;
use std::str::FromStr;

use proto::wasm_host::{wasm_launch_instance_request::WasmRuntime, HttpMethod, HttpScheme, WasmLogLevel};
use thiserror::Error;

// ------------------------------------------------------------------ //
//  Errors                                                             //
// ------------------------------------------------------------------ //

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("Unsupported http scheme {0}")]
    Scheme(String),
    #[error("Unsupported http method {0}")]
    Method(String),
    #[error("Unsupported log level {0}")]
    LogLevel(String),
    #[error("Unsupported runtime {0}")]
    Runtime(String),
}

// ------------------------------------------------------------------ //
//  Scheme                                                             //
// ------------------------------------------------------------------ //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub const VALUES: &'static [&'static str] = &["http", "https"];

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http  => "http",
            Scheme::Https => "https",
        }
    }

    pub fn to_wire(self) -> HttpScheme {
        match self {
            Scheme::Http  => HttpScheme::SchemeHttp,
            Scheme::Https => HttpScheme::SchemeHttps,
        }
    }
}

impl FromStr for Scheme {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http"  => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other   => Err(CodeError::Scheme(other.to_string())),
        }
    }
}

// ------------------------------------------------------------------ //
//  Method                                                             //
// ------------------------------------------------------------------ //

/// HTTP method of a forward packet. Response packets carry [`Method::Get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub const VALUES: &'static [&'static str] = &["get", "put", "post", "delete"];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get    => "get",
            Method::Put    => "put",
            Method::Post   => "post",
            Method::Delete => "delete",
        }
    }

    pub fn to_wire(self) -> HttpMethod {
        match self {
            Method::Get    => HttpMethod::HttpGet,
            Method::Put    => HttpMethod::HttpPut,
            Method::Post   => HttpMethod::HttpPost,
            Method::Delete => HttpMethod::HttpDelete,
        }
    }
}

impl FromStr for Method {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "get"    => Ok(Method::Get),
            "put"    => Ok(Method::Put),
            "post"   => Ok(Method::Post),
            "delete" => Ok(Method::Delete),
            other    => Err(CodeError::Method(other.to_string())),
        }
    }
}

// ------------------------------------------------------------------ //
//  LogLevel                                                           //
// ------------------------------------------------------------------ //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Accepted words; `warn` and `warning` both resolve to [`LogLevel::Warning`].
    pub const VALUES: &'static [&'static str] =
        &["trace", "debug", "info", "warn", "warning", "error", "critical"];

    /// One entry per level, in severity order, for menus.
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace    => "trace",
            LogLevel::Debug    => "debug",
            LogLevel::Info     => "info",
            LogLevel::Warning  => "warn",
            LogLevel::Error    => "error",
            LogLevel::Critical => "critical",
        }
    }

    pub fn to_wire(self) -> WasmLogLevel {
        match self {
            LogLevel::Trace    => WasmLogLevel::WasmLoglevelTrace,
            LogLevel::Debug    => WasmLogLevel::WasmLoglevelDebug,
            LogLevel::Info     => WasmLogLevel::WasmLoglevelInfo,
            LogLevel::Warning  => WasmLogLevel::WasmLoglevelWarning,
            LogLevel::Error    => WasmLogLevel::WasmLoglevelError,
            LogLevel::Critical => WasmLogLevel::WasmLoglevelCritical,
        }
    }
}

impl FromStr for LogLevel {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace"             => Ok(LogLevel::Trace),
            "debug"             => Ok(LogLevel::Debug),
            "info"              => Ok(LogLevel::Info),
            "warn" | "warning"  => Ok(LogLevel::Warning),
            "error"             => Ok(LogLevel::Error),
            "critical"          => Ok(LogLevel::Critical),
            other               => Err(CodeError::LogLevel(other.to_string())),
        }
    }
}

// ------------------------------------------------------------------ //
//  Runtime                                                            //
// ------------------------------------------------------------------ //

/// Wasm engine the host should run an instance on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    WasmEdge,
    Wamr,
    Wasmtime,
}

impl Runtime {
    pub const VALUES: &'static [&'static str] = &["wasmedge", "wasmtime", "wamr"];

    pub fn as_str(self) -> &'static str {
        match self {
            Runtime::WasmEdge => "wasmedge",
            Runtime::Wamr     => "wamr",
            Runtime::Wasmtime => "wasmtime",
        }
    }

    pub fn to_wire(self) -> WasmRuntime {
        match self {
            Runtime::WasmEdge => WasmRuntime::Wasmedge,
            Runtime::Wamr     => WasmRuntime::Wamr,
            Runtime::Wasmtime => WasmRuntime::Wasmtime,
        }
    }
}

impl FromStr for Runtime {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wasmedge" => Ok(Runtime::WasmEdge),
            "wamr"     => Ok(Runtime::Wamr),
            "wasmtime" => Ok(Runtime::Wasmtime),
            other      => Err(CodeError::Runtime(other.to_string())),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.as_str())
                }
            }
        )*
    };
}

display_as_str!(Scheme, Method, LogLevel, Runtime);

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
