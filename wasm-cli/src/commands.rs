//! Operations behind the interactive menus.
//!
//! Every command collects its own options, builds a request locally and
//! makes at most one call to the host. Host failures are reported to the
//! operator and returned as [`Outcome::Failed`]; only terminal I/O errors
//! propagate.

use std::io::Write;

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};

use crate::batch::assemble;
use crate::collector::{collect, CollectError, CollectedOptions};
use crate::codes::{LogLevel, Runtime};
use crate::config::Config;
use crate::console::{Console, ReadLine};
use crate::fields::FieldSpec;
use crate::host::{HostError, InstanceRecord, LaunchRequest, SettingsRequest, WasmHost};
use crate::instance_key::InstanceKey;
use crate::packets::{load_packets, normalize};

const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The operator quit before anything was sent.
    Cancelled,
    Failed(String),
}

// ------------------------------------------------------------------ //
//  Option lists                                                       //
// ------------------------------------------------------------------ //

pub fn create_instance_fields(default_wasm_file: &str) -> Vec<FieldSpec> {
    vec![
        FieldSpec::string("root_id", "Project Name").required(),
        FieldSpec::string("name", "Vm Name").required(),
        FieldSpec::string("wasm_file", "WASM File").default(default_wasm_file),
        FieldSpec::string("log_level", "Log Level")
            .default("debug")
            .valid(LogLevel::VALUES.iter().copied()),
        FieldSpec::string("runtime", "Runtime")
            .default("wasmtime")
            .valid(Runtime::VALUES.iter().copied()),
    ]
}

pub fn send_traffic_fields(default_data_file: &str) -> Vec<FieldSpec> {
    vec![
        FieldSpec::string("project", "Project Name").required(),
        FieldSpec::string("vm_name", "Vm Name [leave it empty to send to all VMs in the project]")
            .default(""),
        FieldSpec::string("data_file", "Packets Data Json File")
            .required()
            .default(default_data_file),
    ]
}

/// `Ok(None)` when the operator quit the prompt.
fn collect_or_cancel<R: ReadLine, W: Write>(
    console: &mut Console<R, W>,
    specs: &[FieldSpec],
) -> Result<Option<CollectedOptions>> {
    match collect(console, specs) {
        Ok(opts) => Ok(Some(opts)),
        Err(CollectError::Cancelled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn report_host_error<R: ReadLine, W: Write>(
    console: &mut Console<R, W>,
    err: HostError,
) -> Result<Outcome> {
    warn!(error = %err, "host call failed");
    console.say(format!("Error: {err}"))?;
    Ok(Outcome::Failed(err.to_string()))
}

// ------------------------------------------------------------------ //
//  Commands                                                           //
// ------------------------------------------------------------------ //

/// Collect launch options and ask the host to start an instance.
pub async fn create_instance<H, R, W>(
    host: &H,
    console: &mut Console<R, W>,
    config: &Config,
) -> Result<Outcome>
where
    H: WasmHost + ?Sized,
    R: ReadLine,
    W: Write,
{
    let Some(opts) = collect_or_cancel(console, &create_instance_fields(&config.wasm_file))? else {
        return Ok(Outcome::Cancelled);
    };

    let req = LaunchRequest {
        project: opts.str("root_id")?.to_string(),
        name: opts.str("name")?.to_string(),
        runtime: opts.str("runtime")?.parse()?,
        wasm_file: opts.str("wasm_file")?.to_string(),
        log_level: opts.str("log_level")?.parse()?,
    };
    let key = format!("{}:{}", req.project, req.name);

    match host.launch_instance(req).await {
        Ok(()) => {
            console.say(format!("Launched instance \"{key}\""))?;
            Ok(Outcome::Done)
        }
        Err(e) => report_host_error(console, e),
    }
}

/// One menu / listing line for an instance; `idx` is 0-based. The creation
/// time is shown in the operator's local timezone.
pub fn describe_instance(idx: usize, rec: &InstanceRecord) -> String {
    let created = rec
        .created_at
        .map(|ts| ts.with_timezone(&Local).format(CREATED_FORMAT).to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{}.    Key = \"{}\" : project \"{}\", created \"{}\"",
        idx + 1,
        rec.key,
        rec.project,
        created
    )
}

pub async fn list_instances<H, R, W>(host: &H, console: &mut Console<R, W>) -> Result<Outcome>
where
    H: WasmHost + ?Sized,
    R: ReadLine,
    W: Write,
{
    let instances = match host.list_instances("").await {
        Ok(instances) => instances,
        Err(e) => return report_host_error(console, e),
    };

    console.say("List of active VMs: ")?;
    for (idx, rec) in instances.iter().enumerate() {
        console.say(describe_instance(idx, rec))?;
    }
    console.say("")?;
    Ok(Outcome::Done)
}

pub async fn set_log_level<H, R, W>(
    host: &H,
    console: &mut Console<R, W>,
    key: &InstanceKey,
    level: LogLevel,
) -> Result<Outcome>
where
    H: WasmHost + ?Sized,
    R: ReadLine,
    W: Write,
{
    let req = SettingsRequest {
        key: key.clone(),
        log_level: Some(level),
    };
    match host.update_settings(req).await {
        Ok(()) => {
            console.say(format!("Log level of \"{key}\" set to {level}"))?;
            Ok(Outcome::Done)
        }
        Err(e) => report_host_error(console, e),
    }
}

/// Load a packets file, normalise it and submit it as one batch.
///
/// Nothing is sent unless every packet in the file normalises.
pub async fn send_traffic<H, R, W>(
    host: &H,
    console: &mut Console<R, W>,
    config: &Config,
) -> Result<Outcome>
where
    H: WasmHost + ?Sized,
    R: ReadLine,
    W: Write,
{
    let Some(opts) = collect_or_cancel(console, &send_traffic_fields(&config.data_file))? else {
        return Ok(Outcome::Cancelled);
    };
    let data_file = opts.str("data_file")?;

    let entries = match load_packets(data_file) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "packets file unusable");
            console.pause(&e)?;
            return Ok(Outcome::Failed(e.to_string()));
        }
    };

    let packets = match normalize(&entries) {
        Ok(packets) => packets,
        Err(e) => {
            warn!(position = e.position, cause = %e.cause, "packet rejected");
            console.pause(format!("Error loading packet number {}. {}", e.position, e.cause))?;
            return Ok(Outcome::Failed(e.to_string()));
        }
    };
    for position in 1..=packets.len() {
        console.say(format!("Added packet {position}"))?;
    }

    let req = assemble(opts.str("project")?, opts.str("vm_name")?, packets);
    let count = req.packets.len();
    info!(project = %req.project, vm_name = %req.vm_name, count, "submitting traffic batch");

    match host.send_traffic(req).await {
        Ok(()) => {
            console.say(format!("Sent {count} packets"))?;
            Ok(Outcome::Done)
        }
        Err(e) => report_host_error(console, e),
    }
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
