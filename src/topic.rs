/// Lifecycle kind carried in the third topic segment of a Sparkplug topic
/// (`spBv1.0/<group>/<kind>/<edge-node>/<device>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Birth,
    Data,
    Death,
    Other,
}

impl MessageKind {
    /// Only birth and data messages carry sensor metrics worth decoding.
    pub fn bears_data(self) -> bool {
        matches!(self, MessageKind::Birth | MessageKind::Data)
    }

    fn from_segment(segment: &str) -> Self {
        match segment {
            "NBIRTH" | "DBIRTH" => MessageKind::Birth,
            "NDATA" | "DDATA" => MessageKind::Data,
            "NDEATH" | "DDEATH" => MessageKind::Death,
            _ => MessageKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicKey {
    pub kind: MessageKind,
    /// Empty when the topic has no device segment; the caller substitutes a
    /// placeholder before writing.
    pub device: String,
}

/// Positional topic classification. Total: missing segments degrade to
/// `Other` / empty device so malformed topics are ignored downstream instead
/// of erroring out of the subscriber loop.
pub fn classify(topic: &str) -> TopicKey {
    let parts: Vec<&str> = topic.split('/').collect();
    TopicKey {
        kind: MessageKind::from_segment(parts.get(2).copied().unwrap_or("")),
        device: parts.get(4).copied().unwrap_or("").to_string(),
    }
}
