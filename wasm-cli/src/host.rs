//! WasmHost trait and implementations.
//!
//! [`GrpcWasmHost`] talks to the remote management service over gRPC;
//! [`FakeWasmHost`] records calls in memory for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use proto::wasm_host::{
    wasm_host_client::WasmHostClient, WasmLaunchInstanceRequest, WasmListInstanceRequest,
    WasmLogLevel, WasmSendTrafficRequest, WasmSettingsRequest, WasmVm,
};
use thiserror::Error;
use tonic::transport::Channel;
use tracing::{error, info};

use crate::batch::BatchTrafficRequest;
use crate::codes::{LogLevel, Runtime};
use crate::instance_key::InstanceKey;

// ------------------------------------------------------------------ //
//  Domain types                                                       //
// ------------------------------------------------------------------ //

/// A running instance as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    /// Composite `project:name` key.
    pub key: String,
    pub project: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<WasmVm> for InstanceRecord {
    fn from(vm: WasmVm) -> Self {
        let created_at = vm.create_ts.and_then(|ts| {
            u32::try_from(ts.nanos)
                .ok()
                .and_then(|nanos| DateTime::from_timestamp(ts.seconds, nanos))
        });
        Self {
            key: vm.key,
            project: vm.project,
            name: vm.name,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub project: String,
    pub name: String,
    pub runtime: Runtime,
    pub wasm_file: String,
    pub log_level: LogLevel,
}

impl From<LaunchRequest> for WasmLaunchInstanceRequest {
    fn from(req: LaunchRequest) -> Self {
        WasmLaunchInstanceRequest {
            name: req.name,
            root_id: req.project,
            runtime: req.runtime.to_wire() as i32,
            wasm_file: req.wasm_file,
            log_level: req.log_level.to_wire() as i32,
        }
    }
}

/// Settings change for one instance. `None` fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsRequest {
    pub key: InstanceKey,
    pub log_level: Option<LogLevel>,
}

impl From<SettingsRequest> for WasmSettingsRequest {
    fn from(req: SettingsRequest) -> Self {
        let log_level = req
            .log_level
            .map_or(WasmLogLevel::WasmLoglevelInvalid, LogLevel::to_wire);
        WasmSettingsRequest {
            project: req.key.project,
            vm_name: req.key.name,
            log_level: log_level as i32,
        }
    }
}

// ------------------------------------------------------------------ //
//  Errors                                                             //
// ------------------------------------------------------------------ //

#[derive(Debug, Error)]
pub enum HostError {
    #[error("invalid server address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },
    #[error("rpc failed: {0}")]
    Transport(#[from] tonic::Status),
    #[error("host rejected request: {0}")]
    Rejected(String),
}

/// A non-empty `error` field in a reply means the host refused the call.
fn check_reply(error: String) -> Result<(), HostError> {
    if error.is_empty() {
        Ok(())
    } else {
        Err(HostError::Rejected(error))
    }
}

// ------------------------------------------------------------------ //
//  Trait                                                              //
// ------------------------------------------------------------------ //

/// The four unary operations of the remote management service.
#[async_trait]
pub trait WasmHost: Send + Sync {
    async fn list_instances(&self, filter: &str) -> Result<Vec<InstanceRecord>, HostError>;
    async fn launch_instance(&self, req: LaunchRequest) -> Result<(), HostError>;
    async fn update_settings(&self, req: SettingsRequest) -> Result<(), HostError>;
    async fn send_traffic(&self, req: BatchTrafficRequest) -> Result<(), HostError>;
}

// ------------------------------------------------------------------ //
//  GrpcWasmHost (production)                                          //
// ------------------------------------------------------------------ //

/// `host:port` → `http://host:port`; addresses with a scheme pass through.
pub fn endpoint_uri(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    }
}

pub struct GrpcWasmHost {
    client: WasmHostClient<Channel>,
}

impl GrpcWasmHost {
    /// Build a client whose channel connects on first use.
    pub fn connect_lazy(addr: &str) -> Result<Self, HostError> {
        let uri = endpoint_uri(addr);
        let channel = Channel::from_shared(uri.clone())
            .map_err(|e| HostError::InvalidAddress {
                addr: uri,
                reason: e.to_string(),
            })?
            .connect_lazy();
        Ok(Self {
            client: WasmHostClient::new(channel),
        })
    }
}

#[async_trait]
impl WasmHost for GrpcWasmHost {
    async fn list_instances(&self, filter: &str) -> Result<Vec<InstanceRecord>, HostError> {
        let mut client = self.client.clone();
        let resp = client
            .list_instances(WasmListInstanceRequest {
                filter: filter.to_string(),
            })
            .await
            .inspect_err(|e| error!(error = %e, "ListInstances rpc failed"))?
            .into_inner();
        check_reply(resp.error)?;
        Ok(resp.vms.into_iter().map(InstanceRecord::from).collect())
    }

    async fn launch_instance(&self, req: LaunchRequest) -> Result<(), HostError> {
        let mut client = self.client.clone();
        info!(project = %req.project, name = %req.name, runtime = %req.runtime, "launching instance");
        let resp = client
            .launch_instance(WasmLaunchInstanceRequest::from(req))
            .await
            .inspect_err(|e| error!(error = %e, "LaunchInstance rpc failed"))?
            .into_inner();
        check_reply(resp.error)
    }

    async fn update_settings(&self, req: SettingsRequest) -> Result<(), HostError> {
        let mut client = self.client.clone();
        info!(key = %req.key, log_level = ?req.log_level, "updating instance settings");
        let resp = client
            .wasm_settings(WasmSettingsRequest::from(req))
            .await
            .inspect_err(|e| error!(error = %e, "WasmSettings rpc failed"))?
            .into_inner();
        check_reply(resp.error)
    }

    async fn send_traffic(&self, req: BatchTrafficRequest) -> Result<(), HostError> {
        let mut client = self.client.clone();
        info!(project = %req.project, vm_name = %req.vm_name, packets = req.packets.len(), "sending traffic");
        let resp = client
            .send_traffic(WasmSendTrafficRequest::from(req))
            .await
            .inspect_err(|e| error!(error = %e, "SendTraffic rpc failed"))?
            .into_inner();
        check_reply(resp.error)
    }
}

// ------------------------------------------------------------------ //
//  FakeWasmHost (for tests)                                           //
// ------------------------------------------------------------------ //

/// A call received by [`FakeWasmHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    List(String),
    Launch(LaunchRequest),
    Settings(SettingsRequest),
    Traffic(BatchTrafficRequest),
}

/// In-memory host that records every call and serves a fixed instance list.
#[derive(Debug, Default, Clone)]
pub struct FakeWasmHost {
    pub instances: Vec<InstanceRecord>,
    /// When set, every call fails with [`HostError::Rejected`].
    pub reject_with: Option<String>,
    calls: Arc<Mutex<Vec<HostCall>>>,
}

impl FakeWasmHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instances(instances: Vec<InstanceRecord>) -> Self {
        Self {
            instances,
            ..Self::default()
        }
    }

    pub fn rejecting(message: impl Into<String>) -> Self {
        Self {
            reject_with: Some(message.into()),
            ..Self::default()
        }
    }

    /// Non-destructive snapshot of the calls received so far.
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: HostCall) -> Result<(), HostError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        match &self.reject_with {
            Some(message) => Err(HostError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WasmHost for FakeWasmHost {
    async fn list_instances(&self, filter: &str) -> Result<Vec<InstanceRecord>, HostError> {
        self.record(HostCall::List(filter.to_string()))?;
        Ok(self.instances.clone())
    }

    async fn launch_instance(&self, req: LaunchRequest) -> Result<(), HostError> {
        self.record(HostCall::Launch(req))
    }

    async fn update_settings(&self, req: SettingsRequest) -> Result<(), HostError> {
        self.record(HostCall::Settings(req))
    }

    async fn send_traffic(&self, req: BatchTrafficRequest) -> Result<(), HostError> {
        self.record(HostCall::Traffic(req))
    }
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
