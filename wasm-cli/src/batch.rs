//! Batch traffic request assembly.

use proto::wasm_host::{KeyValue, WasmHttpPacket, WasmSendTrafficRequest};

use crate::packets::NormalizedPacket;

/// Normalised packets plus the instances they are addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchTrafficRequest {
    pub project: String,
    /// Empty sends to every instance in `project`.
    pub vm_name: String,
    pub packets: Vec<NormalizedPacket>,
}

/// Wrap `packets` in a request, keeping their order.
pub fn assemble(
    project: impl Into<String>,
    vm_name: impl Into<String>,
    packets: Vec<NormalizedPacket>,
) -> BatchTrafficRequest {
    BatchTrafficRequest {
        project: project.into(),
        vm_name: vm_name.into(),
        packets,
    }
}

fn key_values(pairs: Vec<(String, String)>) -> Vec<KeyValue> {
    pairs
        .into_iter()
        .map(|(key, value)| KeyValue { key, value })
        .collect()
}

impl From<NormalizedPacket> for WasmHttpPacket {
    fn from(p: NormalizedPacket) -> Self {
        WasmHttpPacket {
            sip: p.sip,
            sp: u32::from(p.sp),
            dip: p.dip,
            dp: u32::from(p.dp),
            scheme: p.scheme.to_wire() as i32,
            uri_path: p.uri_path,
            forward_direction: p.forward_direction,
            method: p.method.to_wire() as i32,
            query_params: key_values(p.query_params),
            headers: key_values(p.headers),
            delta_ms: p.delta_ms,
        }
    }
}

impl From<BatchTrafficRequest> for WasmSendTrafficRequest {
    fn from(req: BatchTrafficRequest) -> Self {
        WasmSendTrafficRequest {
            project: req.project,
            vm_name: req.vm_name,
            packets: req.packets.into_iter().map(WasmHttpPacket::from).collect(),
        }
    }
}
