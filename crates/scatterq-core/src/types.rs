//! Data model shared by the collaborators, the strategies, and the aggregator.
//!
//! `ChunkResult` keeps its statistics private: once the query collaborator has
//! produced a chunk, only its payload can be replaced (see [`ChunkResult::with_payload`]).

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::format::{InputFormat, OutputFormat};

/// One object in a catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    pub key: String,
    pub size: u64,
}

impl ObjectDescriptor {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }
}

/// Ordered result of listing a scope, with totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub objects: Vec<ObjectDescriptor>,
    pub total_objects: u64,
    pub total_bytes: u64,
}

impl Listing {
    pub fn from_objects(objects: Vec<ObjectDescriptor>) -> Self {
        let total_bytes = objects.iter().map(|o| o.size).sum();
        Self {
            total_objects: objects.len() as u64,
            total_bytes,
            objects,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|o| o.key.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Byte accounting reported by the remote query for one object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub bytes_scanned: u64,
    pub bytes_processed: u64,
    pub bytes_returned: u64,
}

impl ScanStats {
    pub const fn new(bytes_scanned: u64, bytes_processed: u64, bytes_returned: u64) -> Self {
        Self {
            bytes_scanned,
            bytes_processed,
            bytes_returned,
        }
    }
}

impl AddAssign for ScanStats {
    fn add_assign(&mut self, rhs: Self) {
        self.bytes_scanned += rhs.bytes_scanned;
        self.bytes_processed += rhs.bytes_processed;
        self.bytes_returned += rhs.bytes_returned;
    }
}

/// Query output for exactly one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkResult {
    payload: String,
    stats: ScanStats,
}

impl ChunkResult {
    pub fn new(payload: impl Into<String>, stats: ScanStats) -> Self {
        Self {
            payload: payload.into(),
            stats,
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    /// Replace the payload, keeping the statistics untouched.
    pub fn with_payload(self, payload: String) -> Self {
        Self {
            payload,
            stats: self.stats,
        }
    }

    pub fn into_parts(self) -> (String, ScanStats) {
        (self.payload, self.stats)
    }
}

/// An object that failed under the isolating failure policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFailure {
    pub key: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Realized cost in dollars.
    pub cost: f64,
    pub files_processed: u64,
    pub bytes_scanned: u64,
    pub bytes_returned: u64,
    pub bytes_processed: u64,
}

/// Merged output of one `select` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Chunk payloads in listing order.
    pub payload: Vec<String>,
    pub stats: AggregateStats,
    /// Always empty unless failures are isolated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ChunkFailure>,
}

/// The query plus the formats it runs with; shared read-only by every unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub input: InputFormat,
    #[serde(default)]
    pub output: OutputFormat,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            input: InputFormat::default(),
            output: OutputFormat::default(),
        }
    }

    pub fn with_input(mut self, input: InputFormat) -> Self {
        self.input = input;
        self
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_totals_follow_objects() {
        let listing = Listing::from_objects(vec![
            ObjectDescriptor::new("a/1.json", 10),
            ObjectDescriptor::new("a/2.json", 32),
        ]);
        assert_eq!(listing.total_objects, 2);
        assert_eq!(listing.total_bytes, 42);
        assert_eq!(listing.keys().collect::<Vec<_>>(), vec!["a/1.json", "a/2.json"]);
    }

    #[test]
    fn with_payload_keeps_stats() {
        let stats = ScanStats::new(30, 30, 10);
        let chunk = ChunkResult::new("raw", stats);
        let rewritten = chunk.with_payload("cooked".to_string());
        assert_eq!(rewritten.payload(), "cooked");
        assert_eq!(rewritten.stats(), stats);
    }

    #[test]
    fn scan_stats_accumulate() {
        let mut total = ScanStats::default();
        total += ScanStats::new(1, 2, 3);
        total += ScanStats::new(10, 20, 30);
        assert_eq!(total, ScanStats::new(11, 22, 33));
    }
}
