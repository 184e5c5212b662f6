//! Hand-written prost types for the subset of the Sparkplug B payload this
//! service consumes: a flat metric list with scalar values. Field numbers
//! follow sparkplug_b.proto so payloads from stock publishers decode as-is.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Payload {
    #[prost(uint64, optional, tag = "1")]
    pub timestamp: Option<u64>,
    #[prost(message, repeated, tag = "2")]
    pub metrics: Vec<Metric>,
    #[prost(uint64, optional, tag = "3")]
    pub seq: Option<u64>,
    #[prost(string, optional, tag = "4")]
    pub uuid: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metric {
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
    #[prost(uint64, optional, tag = "2")]
    pub alias: Option<u64>,
    #[prost(uint64, optional, tag = "3")]
    pub timestamp: Option<u64>,
    #[prost(uint32, optional, tag = "4")]
    pub datatype: Option<u32>,
    #[prost(oneof = "MetricValue", tags = "10, 11, 12, 13, 14, 15")]
    pub value: Option<MetricValue>,
}

#[derive(Clone, PartialEq, ::prost::Oneof)]
pub enum MetricValue {
    #[prost(uint32, tag = "10")]
    IntValue(u32),
    #[prost(uint64, tag = "11")]
    LongValue(u64),
    #[prost(float, tag = "12")]
    FloatValue(f32),
    #[prost(double, tag = "13")]
    DoubleValue(f64),
    #[prost(bool, tag = "14")]
    BooleanValue(bool),
    #[prost(string, tag = "15")]
    StringValue(String),
}

impl MetricValue {
    /// Numeric reading for a floating-point metric. Accepts the full
    /// float/double/int/long alternative chain; boolean and string values are
    /// not sensor readings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::FloatValue(v) => Some(f64::from(*v)),
            MetricValue::DoubleValue(v) => Some(*v),
            MetricValue::IntValue(v) => Some(f64::from(*v)),
            MetricValue::LongValue(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Numeric reading for an integral metric; only int/long qualify.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetricValue::IntValue(v) => Some(i64::from(*v)),
            MetricValue::LongValue(v) => Some(*v as i64),
            _ => None,
        }
    }
}

#[cfg(test)]
impl Metric {
    pub fn named(name: &str, value: MetricValue) -> Self {
        Metric {
            name: Some(name.to_string()),
            alias: None,
            timestamp: None,
            datatype: None,
            value: Some(value),
        }
    }
}
