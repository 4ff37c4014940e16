use serde::{Deserialize, Deserializer, Serialize};

use super::codec::CodecError;

/// Internal timed-text format: three parallel arrays, times in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sjson {
    pub start: Vec<u64>,
    pub end: Vec<u64>,
    #[serde(deserialize_with = "null_text_as_empty")]
    pub text: Vec<String>,
}

fn null_text_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<Option<String>> = Vec::deserialize(deserializer)?;
    Ok(raw.into_iter().map(Option::unwrap_or_default).collect())
}

impl Sjson {
    pub fn len(&self) -> usize {
        self.start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_empty()
    }

    pub fn push(&mut self, start: u64, end: u64, text: impl Into<String>) {
        self.start.push(start);
        self.end.push(end);
        self.text.push(text.into());
    }

    pub fn has_parallel_arrays(&self) -> bool {
        self.start.len() == self.end.len() && self.end.len() == self.text.len()
    }

    /// Checks the cue invariants: parallel arrays, `end >= start`, non-decreasing starts.
    pub fn validate(&self) -> Result<(), CodecError> {
        if !self.has_parallel_arrays() {
            return Err(CodecError::InvalidSjson(format!(
                "array lengths differ: start={}, end={}, text={}",
                self.start.len(),
                self.end.len(),
                self.text.len()
            )));
        }
        for (index, (start, end)) in self.start.iter().zip(&self.end).enumerate() {
            if end < start {
                return Err(CodecError::InvalidCue {
                    index,
                    reason: format!("end {end} precedes start {start}"),
                });
            }
        }
        if let Some(index) = self.start.windows(2).position(|w| w[1] < w[0]) {
            return Err(CodecError::InvalidCue {
                index: index + 1,
                reason: "cues are not ordered by start time".to_string(),
            });
        }
        Ok(())
    }

    /// Stored bytes as text. UTF-8 is tried first, Latin-1 otherwise.
    pub fn text_from_slice(bytes: &[u8]) -> String {
        match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::from_json(&Self::text_from_slice(bytes))
    }

    pub fn from_json(content: &str) -> Result<Self, CodecError> {
        let content = content.trim_start_matches('\u{feff}');
        serde_json::from_str(content).map_err(|e| CodecError::InvalidSjson(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|e| CodecError::InvalidSjson(e.to_string()))
    }

    /// Storage form, indented by two spaces.
    pub fn to_pretty_bytes(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec_pretty(self).map_err(|e| CodecError::InvalidSjson(e.to_string()))
    }
}
