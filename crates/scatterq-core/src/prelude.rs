//! Convenient re-exports for downstream crates.

pub use crate::config::{ConnectionConfig, EngineConfig, FailurePolicy, Scope};
pub use crate::cost::{sum_cost, CostModel, RequestPricing};
pub use crate::error::{Error, HookError, Result};
pub use crate::format::{
    CompressionType, CsvInput, CsvOutput, FileHeaderInfo, InputFormat, JsonInput, JsonOutput,
    JsonType, OutputFormat, ParquetInput, QuoteFields,
};
pub use crate::hook::{HookArgs, HookFn, TransformHook};
pub use crate::types::{
    AggregateResult, AggregateStats, ChunkFailure, ChunkResult, Listing, ObjectDescriptor,
    QueryRequest, ScanStats,
};
