use crate::sparkplug::Payload;
use prost::Message;
use serde::Deserialize;

/// Normalized sensor readings for one message. An empty set is a legitimate
/// decode outcome (birth/death control payloads carry no sensor data) and
/// means "nothing to write".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSet {
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub rotational_speed: Option<i64>,
}

impl MetricSet {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.pressure.is_none() && self.rotational_speed.is_none()
    }
}

/// Decode a payload of unannounced format by probing, most specific format
/// first: Sparkplug B protobuf, then JSON, then `k=v` delimited text. The
/// first strategy yielding a non-empty set wins; each strategy contains its
/// own parse failures. Total: worst case is an empty set, never an error.
///
/// `sparkplug_enabled` statically disables the protobuf probe, for brokers
/// where publishers are known to send only JSON or text.
pub fn decode(payload: &[u8], sparkplug_enabled: bool) -> MetricSet {
    if sparkplug_enabled {
        if let Some(set) = decode_sparkplug(payload) {
            if !set.is_empty() {
                return set;
            }
        }
    }
    if let Some(set) = decode_json(payload) {
        if !set.is_empty() {
            return set;
        }
    }
    decode_delimited(payload)
}

fn decode_sparkplug(payload: &[u8]) -> Option<MetricSet> {
    let decoded = Payload::decode(payload).ok()?;
    let mut set = MetricSet::default();
    for metric in &decoded.metrics {
        let name = match metric.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => continue,
        };
        let Some(value) = &metric.value else { continue };
        match name {
            "temp" => {
                if let Some(v) = value.as_f64() {
                    set.temperature = Some(v);
                }
            }
            "tryk" => {
                if let Some(v) = value.as_f64() {
                    set.pressure = Some(v);
                }
            }
            "rpm" => {
                if let Some(v) = value.as_i64() {
                    set.rotational_speed = Some(v);
                }
            }
            _ => {}
        }
    }
    Some(set)
}

#[derive(Debug, Deserialize)]
struct JsonReading {
    #[serde(default)]
    temp: Option<JsonNumber>,
    #[serde(default)]
    tryk: Option<JsonNumber>,
    #[serde(default)]
    rpm: Option<JsonNumber>,
}

/// ESP32 firmware revisions have sent numbers both bare and quoted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl JsonNumber {
    fn to_f64(&self) -> Option<f64> {
        match self {
            JsonNumber::Int(v) => Some(*v as f64),
            JsonNumber::Float(v) => Some(*v),
            JsonNumber::Text(raw) => raw.trim().parse().ok(),
        }
    }

    fn to_i64(&self) -> Option<i64> {
        match self {
            JsonNumber::Int(v) => Some(*v),
            JsonNumber::Float(v) => Some(*v as i64),
            JsonNumber::Text(raw) => raw.trim().parse().ok(),
        }
    }
}

/// A known key that fails coercion fails the whole strategy, so the payload
/// gets another chance as delimited text.
fn decode_json(payload: &[u8]) -> Option<MetricSet> {
    let mut buf = payload.to_vec();
    let reading: JsonReading = simd_json::from_slice(&mut buf).ok()?;
    let mut set = MetricSet::default();
    if let Some(value) = &reading.temp {
        set.temperature = Some(value.to_f64()?);
    }
    if let Some(value) = &reading.tryk {
        set.pressure = Some(value.to_f64()?);
    }
    if let Some(value) = &reading.rpm {
        set.rotational_speed = Some(value.to_i64()?);
    }
    Some(set)
}

/// Decoder of last resort: `temp=23,tryk=12,rpm=850`. Segments without `=`
/// or with unknown keys are skipped; a segment that fails to coerce is logged
/// and skipped without aborting the rest.
fn decode_delimited(payload: &[u8]) -> MetricSet {
    let mut set = MetricSet::default();
    let text = String::from_utf8_lossy(payload);
    let text = text.trim();
    if text.is_empty() {
        return set;
    }

    for segment in text.split(',') {
        let Some((key, raw)) = segment.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let raw = raw.trim();
        match key {
            "temp" | "tryk" => match raw.parse::<f64>() {
                Ok(value) => {
                    if key == "temp" {
                        set.temperature = Some(value);
                    } else {
                        set.pressure = Some(value);
                    }
                }
                Err(err) => tracing::warn!(key, raw, error=%err, "skipping text segment"),
            },
            "rpm" => match raw.parse::<i64>() {
                Ok(value) => set.rotational_speed = Some(value),
                Err(err) => tracing::warn!(raw, error=%err, "skipping rpm text segment"),
            },
            _ => {}
        }
    }

    set
}
