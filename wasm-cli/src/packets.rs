//! Packet-file loading and normalisation.
//!
//! A packets file is a JSON array of loosely-typed packet descriptions. Each
//! entry is converted into a [`NormalizedPacket`] in file order; the first
//! entry that cannot be converted stops the run and is reported with its
//! 1-based position.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::debug;

use crate::codes::{CodeError, Method, Scheme};

// ------------------------------------------------------------------ //
//  Types                                                              //
// ------------------------------------------------------------------ //

/// One element of a packets file, exactly as found.
///
/// Kept as a raw JSON value so that an element of the wrong shape is reported
/// against its position by [`normalize`] instead of failing the whole load.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RawPacketEntry(Value);

impl RawPacketEntry {
    /// Field `key`; JSON `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }
}

impl From<Value> for RawPacketEntry {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Validated packet ready to be placed in a traffic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPacket {
    pub sip: String,
    pub sp: u16,
    pub dip: String,
    pub dp: u16,
    pub scheme: Scheme,
    pub uri_path: String,
    pub forward_direction: bool,
    /// Only validated for forward packets; response packets carry the default.
    pub method: Method,
    /// Key/value pairs in the order the file listed them.
    pub query_params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub delta_ms: u32,
}

// ------------------------------------------------------------------ //
//  Errors                                                             //
// ------------------------------------------------------------------ //

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Error opening {} - {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error loading {} - {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a single entry could not be normalised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("entry must be an object, got {0}")]
    NotObject(String),
    #[error("missing field '{0}'")]
    MissingField(&'static str),
    #[error("field '{field}' must be a string, got {value}")]
    NotText { field: &'static str, value: String },
    #[error("invalid port '{value}' in field '{field}'")]
    InvalidPort { field: &'static str, value: String },
    #[error(transparent)]
    Code(#[from] CodeError),
    #[error("invalid forward_direction '{0}'")]
    InvalidDirection(String),
    #[error("field '{0}' must be an object of key/value pairs")]
    InvalidMapping(&'static str),
    #[error("value of '{key}' in '{field}' must be a string, number or boolean")]
    InvalidMappingValue { field: &'static str, key: String },
    #[error("invalid delta_ms '{0}'")]
    InvalidDelay(String),
}

/// First failing entry of a normalisation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("packet number {position}: {cause}")]
pub struct NormalizeError {
    /// 1-based index into the input sequence.
    pub position: usize,
    pub cause: PacketError,
}

// ------------------------------------------------------------------ //
//  Loading                                                            //
// ------------------------------------------------------------------ //

/// Read a packets file: a JSON array. Elements are checked by [`normalize`].
pub fn load_packets(path: impl AsRef<Path>) -> Result<Vec<RawPacketEntry>, SourceError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SourceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// ------------------------------------------------------------------ //
//  Normalisation                                                      //
// ------------------------------------------------------------------ //

/// Normalise `entries` in order, stopping at the first malformed entry.
pub fn normalize(entries: &[RawPacketEntry]) -> Result<Vec<NormalizedPacket>, NormalizeError> {
    let mut packets = Vec::with_capacity(entries.len());

    for (idx, entry) in entries.iter().enumerate() {
        let position = idx + 1;
        let packet = normalize_entry(entry).map_err(|cause| NormalizeError { position, cause })?;
        debug!(position, sip = %packet.sip, dip = %packet.dip, "added packet");
        packets.push(packet);
    }

    Ok(packets)
}

/// Convert a single entry.
pub fn normalize_entry(entry: &RawPacketEntry) -> Result<NormalizedPacket, PacketError> {
    if !entry.0.is_object() {
        return Err(PacketError::NotObject(render(&entry.0)));
    }

    let sip = text("sip", entry.get("sip"))?;
    let sp = port("sp", entry.get("sp"))?;
    let dip = text("dip", entry.get("dip"))?;
    let dp = port("dp", entry.get("dp"))?;
    let scheme: Scheme = match entry.get("scheme") {
        Some(v) => render(v).parse()?,
        None => return Err(PacketError::MissingField("scheme")),
    };
    let uri_path = text("uri_path", entry.get("uri_path"))?;
    let forward_direction = direction(entry.get("forward_direction"))?;

    let method = if forward_direction {
        entry.get("method").map(render).unwrap_or_default().parse::<Method>()?
    } else {
        Method::default()
    };

    Ok(NormalizedPacket {
        sip,
        sp,
        dip,
        dp,
        scheme,
        uri_path,
        forward_direction,
        method,
        query_params: pairs("query_params", entry.get("query_params"))?,
        headers: pairs("headers", entry.get("headers"))?,
        delta_ms: delay(entry.get("delta_ms"))?,
    })
}

fn text(field: &'static str, value: Option<&Value>) -> Result<String, PacketError> {
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(PacketError::NotText { field, value: other.to_string() }),
        None => Err(PacketError::MissingField(field)),
    }
}

/// Non-negative integer, also when written as a float with no fraction (`80.0`).
fn whole(n: &Number) -> Option<u64> {
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

fn port(field: &'static str, value: Option<&Value>) -> Result<u16, PacketError> {
    let invalid = |v: &Value| PacketError::InvalidPort { field, value: render(v) };
    match value {
        Some(v @ Value::Number(n)) => whole(n)
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| invalid(v)),
        Some(v @ Value::String(s)) => s.trim().parse::<u16>().map_err(|_| invalid(v)),
        Some(v) => Err(invalid(v)),
        None => Err(PacketError::MissingField(field)),
    }
}

fn direction(value: Option<&Value>) -> Result<bool, PacketError> {
    match value {
        Some(Value::Bool(b)) => Ok(*b),
        Some(v @ Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(PacketError::InvalidDirection(render(v))),
        },
        Some(v @ Value::Number(n)) => match whole(n) {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(PacketError::InvalidDirection(render(v))),
        },
        Some(v) => Err(PacketError::InvalidDirection(render(v))),
        None => Err(PacketError::MissingField("forward_direction")),
    }
}

/// Object → ordered key/value pairs; absent means no pairs.
fn pairs(field: &'static str, value: Option<&Value>) -> Result<Vec<(String, String)>, PacketError> {
    let map = match value {
        None => return Ok(Vec::new()),
        Some(Value::Object(map)) => map,
        Some(_) => return Err(PacketError::InvalidMapping(field)),
    };

    map.iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => {
                    return Err(PacketError::InvalidMappingValue { field, key: k.clone() });
                }
            };
            Ok((k.clone(), v))
        })
        .collect()
}

fn delay(value: Option<&Value>) -> Result<u32, PacketError> {
    match value {
        None => Ok(0),
        Some(v @ Value::Number(n)) => whole(n)
            .and_then(|d| u32::try_from(d).ok())
            .ok_or_else(|| PacketError::InvalidDelay(render(v))),
        Some(v @ Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| PacketError::InvalidDelay(render(v))),
        Some(v) => Err(PacketError::InvalidDelay(render(v))),
    }
}

/// Strings without their JSON quotes, everything else as JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    fn entry(value: Value) -> RawPacketEntry {
        serde_json::from_value(value).unwrap()
    }

    fn get_packet() -> Value {
        json!({
            "sip": "10.0.0.1",
            "sp": "1000",
            "dip": "10.0.0.2",
            "dp": "80",
            "scheme": "http",
            "uri_path": "/",
            "forward_direction": true,
            "method": "get"
        })
    }

    fn with(mut base: Value, key: &str, value: Value) -> Value {
        base[key] = value;
        base
    }

    #[test]
    fn normalizes_minimal_forward_packet() {
        let pkt = normalize_entry(&entry(get_packet())).unwrap();
        assert_eq!(pkt.sip, "10.0.0.1");
        assert_eq!(pkt.sp, 1000);
        assert_eq!(pkt.dip, "10.0.0.2");
        assert_eq!(pkt.dp, 80);
        assert_eq!(pkt.scheme, Scheme::Http);
        assert_eq!(pkt.method, Method::Get);
        assert!(pkt.forward_direction);
        assert_eq!(pkt.delta_ms, 0);
        assert!(pkt.query_params.is_empty());
        assert!(pkt.headers.is_empty());
    }

    #[test]
    fn scheme_and_method_are_case_insensitive() {
        let raw = with(with(get_packet(), "scheme", json!("HTTPS")), "method", json!("Post"));
        let pkt = normalize_entry(&entry(raw)).unwrap();
        assert_eq!(pkt.scheme, Scheme::Https);
        assert_eq!(pkt.method, Method::Post);
    }

    #[test]
    fn numeric_ports_and_delay_are_accepted() {
        let raw = with(with(get_packet(), "dp", json!(443)), "delta_ms", json!(250));
        let pkt = normalize_entry(&entry(raw)).unwrap();
        assert_eq!(pkt.dp, 443);
        assert_eq!(pkt.delta_ms, 250);
    }

    #[test]
    fn integral_float_ports_and_delay_are_accepted() {
        let raw = with(with(get_packet(), "dp", json!(80.0)), "delta_ms", json!(250.0));
        let pkt = normalize_entry(&entry(raw)).unwrap();
        assert_eq!(pkt.dp, 80);
        assert_eq!(pkt.delta_ms, 250);
    }

    #[test]
    fn fractional_or_negative_numbers_are_rejected() {
        let raw = with(get_packet(), "sp", json!(80.5));
        assert_eq!(
            normalize_entry(&entry(raw)),
            Err(PacketError::InvalidPort { field: "sp", value: "80.5".into() })
        );

        let raw = with(get_packet(), "dp", json!(-1.0));
        assert!(matches!(normalize_entry(&entry(raw)), Err(PacketError::InvalidPort { field: "dp", .. })));

        let raw = with(get_packet(), "delta_ms", json!(1.5));
        assert_eq!(normalize_entry(&entry(raw)), Err(PacketError::InvalidDelay("1.5".into())));
    }

    #[test]
    fn unsupported_scheme_fails() {
        let raw = with(get_packet(), "scheme", json!("ftp"));
        let err = normalize_entry(&entry(raw)).unwrap_err();
        assert_eq!(err, PacketError::Code(CodeError::Scheme("ftp".into())));
        assert_eq!(err.to_string(), "Unsupported http scheme ftp");
    }

    #[test]
    fn non_text_scheme_and_method_are_unsupported_codes() {
        let raw = with(get_packet(), "scheme", json!(1));
        assert_eq!(
            normalize_entry(&entry(raw)),
            Err(PacketError::Code(CodeError::Scheme("1".into())))
        );

        let raw = with(get_packet(), "method", json!(5));
        assert_eq!(
            normalize_entry(&entry(raw)),
            Err(PacketError::Code(CodeError::Method("5".into())))
        );
    }

    #[test]
    fn null_field_counts_as_missing() {
        let raw = with(get_packet(), "uri_path", Value::Null);
        assert_eq!(normalize_entry(&entry(raw)), Err(PacketError::MissingField("uri_path")));
    }

    #[test]
    fn forward_packet_requires_known_method() {
        let raw = with(get_packet(), "method", json!("patch"));
        assert!(matches!(
            normalize_entry(&entry(raw)),
            Err(PacketError::Code(CodeError::Method(_)))
        ));

        let mut raw = get_packet();
        raw.as_object_mut().unwrap().remove("method");
        assert_eq!(
            normalize_entry(&entry(raw)),
            Err(PacketError::Code(CodeError::Method(String::new())))
        );
    }

    #[test]
    fn response_packet_skips_method_validation() {
        let raw = with(with(get_packet(), "forward_direction", json!(false)), "method", json!("bogus"));
        let pkt = normalize_entry(&entry(raw)).unwrap();
        assert!(!pkt.forward_direction);
        assert_eq!(pkt.method, Method::Get);
    }

    #[test]
    fn bad_port_fails() {
        let raw = with(get_packet(), "sp", json!("http"));
        assert_eq!(
            normalize_entry(&entry(raw)),
            Err(PacketError::InvalidPort { field: "sp", value: "http".into() })
        );

        let raw = with(get_packet(), "dp", json!(70000));
        assert!(matches!(normalize_entry(&entry(raw)), Err(PacketError::InvalidPort { field: "dp", .. })));
    }

    #[test]
    fn missing_required_field_fails() {
        let mut raw = get_packet();
        raw.as_object_mut().unwrap().remove("uri_path");
        assert_eq!(normalize_entry(&entry(raw)), Err(PacketError::MissingField("uri_path")));
    }

    #[test]
    fn direction_accepts_text_and_flags() {
        for (v, expected) in [(json!("TRUE"), true), (json!(0), false), (json!("false"), false)] {
            let raw = with(get_packet(), "forward_direction", v);
            assert_eq!(normalize_entry(&entry(raw)).unwrap().forward_direction, expected);
        }
        let raw = with(get_packet(), "forward_direction", json!("sideways"));
        assert!(matches!(normalize_entry(&entry(raw)), Err(PacketError::InvalidDirection(_))));
    }

    #[test]
    fn headers_and_query_params_keep_file_order() {
        let raw = with(
            with(get_packet(), "headers", json!({"z-trace": "1", "accept": "*/*", "host": "example.com"})),
            "query_params",
            json!({"q": "rust", "a": 2, "debug": true}),
        );
        let pkt = normalize_entry(&entry(raw)).unwrap();

        let header_keys: Vec<&str> = pkt.headers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(header_keys, ["z-trace", "accept", "host"]);
        assert_eq!(
            pkt.query_params,
            vec![
                ("q".to_string(), "rust".to_string()),
                ("a".to_string(), "2".to_string()),
                ("debug".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn nested_header_value_fails() {
        let raw = with(get_packet(), "headers", json!({"x": {"y": 1}}));
        assert_eq!(
            normalize_entry(&entry(raw)),
            Err(PacketError::InvalidMappingValue { field: "headers", key: "x".into() })
        );
    }

    #[test]
    fn normalize_preserves_length_and_order() {
        let entries: Vec<RawPacketEntry> = (0..5)
            .map(|i| entry(with(get_packet(), "uri_path", json!(format!("/p{i}")))))
            .collect();

        let packets = normalize(&entries).unwrap();

        assert_eq!(packets.len(), 5);
        for (i, p) in packets.iter().enumerate() {
            assert_eq!(p.uri_path, format!("/p{i}"));
        }
    }

    #[test]
    fn normalize_stops_at_first_malformed_entry() {
        let entries = vec![
            entry(get_packet()),
            entry(get_packet()),
            entry(with(get_packet(), "scheme", json!("ftp"))),
            entry(with(get_packet(), "sp", json!("bad"))),
        ];

        let err = normalize(&entries).unwrap_err();

        assert_eq!(err.position, 3);
        assert_eq!(err.cause, PacketError::Code(CodeError::Scheme("ftp".into())));
        assert_eq!(err.to_string(), "packet number 3: Unsupported http scheme ftp");
    }

    #[test]
    fn empty_input_normalizes_to_empty_batch() {
        assert!(normalize(&[]).unwrap().is_empty());
    }

    #[test]
    fn load_packets_reads_json_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json!([get_packet(), get_packet()])).unwrap();

        let entries = load_packets(file.path()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].get("scheme"), Some(&json!("http")));
    }

    #[test]
    fn load_packets_accepts_non_object_elements() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json!([get_packet(), 42])).unwrap();

        let entries = load_packets(file.path()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1], RawPacketEntry::from(json!(42)));
    }

    #[test]
    fn non_object_entry_is_reported_at_its_position() {
        let entries = vec![entry(get_packet()), entry(json!(42))];

        let err = normalize(&entries).unwrap_err();

        assert_eq!(err.position, 2);
        assert_eq!(err.cause, PacketError::NotObject("42".into()));
        assert_eq!(err.to_string(), "packet number 2: entry must be an object, got 42");
    }

    #[test]
    fn bundled_sample_file_normalizes() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/http_4pkts.json");

        let packets = normalize(&load_packets(path).unwrap()).unwrap();

        assert_eq!(packets.len(), 4);
        assert_eq!(packets[0].headers[0], ("host".to_string(), "example.com".to_string()));
        assert!(!packets[1].forward_direction);
        assert_eq!(packets[2].method, Method::Post);
        assert_eq!(packets[3].delta_ms, 3);
    }

    #[test]
    fn load_packets_reports_missing_file() {
        let err = load_packets("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SourceError::Read { .. }));
    }

    #[test]
    fn load_packets_reports_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{{\"sip\": ").unwrap();

        let err = load_packets(file.path()).unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
    }
}
