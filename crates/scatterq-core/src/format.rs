//! Input/output format configuration for the remote query.
//!
//! Each side is configured through a plain record (`InputFormatRecord`,
//! `OutputFormatRecord`) that mirrors the key/value shape the query
//! collaborator expects, e.g. `{"CompressionType": "NONE", "JSON": {"Type": "DOCUMENT"}}`.
//! Records are validated when converted into [`InputFormat`] / [`OutputFormat`]:
//! exactly one format must be set, and enumerated options only accept their
//! documented values. Both validated types (de)serialize through their record,
//! so a bad YAML/JSON config fails at load time rather than mid-execution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(Error::Config(format!(
                        "invalid {} '{}'; expected one of {:?}",
                        stringify!($name),
                        other,
                        [$($wire),+]
                    ))),
                }
            }
        }
    };
}

wire_enum!(
    /// Compression applied to the stored object.
    CompressionType { None => "NONE", Gzip => "GZIP", Bzip2 => "BZIP2" }
);

wire_enum!(
    /// How the first line of a CSV object is treated.
    FileHeaderInfo { Use => "USE", Ignore => "IGNORE", None => "NONE" }
);

wire_enum!(
    JsonType { Document => "DOCUMENT", Lines => "LINES" }
);

wire_enum!(
    QuoteFields { Always => "ALWAYS", AsNeeded => "ASNEEDED" }
);

impl Default for CompressionType {
    fn default() -> Self {
        CompressionType::None
    }
}

impl Default for JsonType {
    fn default() -> Self {
        JsonType::Document
    }
}

impl Default for QuoteFields {
    fn default() -> Self {
        QuoteFields::AsNeeded
    }
}

// --- input ---

/// CSV input options. Unset options are omitted from the wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CsvInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_header_info: Option<FileHeaderInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_escape_character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_quoted_record_delimiter: Option<bool>,
}

impl CsvInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_header_info(mut self, info: FileHeaderInfo) -> Self {
        self.file_header_info = Some(info);
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    pub fn with_quote_escape_character(mut self, c: impl Into<String>) -> Self {
        self.quote_escape_character = Some(c.into());
        self
    }

    pub fn with_record_delimiter(mut self, d: impl Into<String>) -> Self {
        self.record_delimiter = Some(d.into());
        self
    }

    pub fn with_field_delimiter(mut self, d: impl Into<String>) -> Self {
        self.field_delimiter = Some(d.into());
        self
    }

    pub fn with_quote_character(mut self, c: impl Into<String>) -> Self {
        self.quote_character = Some(c.into());
        self
    }

    pub fn with_allow_quoted_record_delimiter(mut self, allow: bool) -> Self {
        self.allow_quoted_record_delimiter = Some(allow);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonInput {
    #[serde(rename = "Type", default)]
    pub json_type: JsonType,
}

/// Columnar input; takes no options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParquetInput {}

/// Unvalidated input configuration in wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputFormatRecord {
    #[serde(rename = "CompressionType", default)]
    pub compression_type: CompressionType,
    #[serde(rename = "CSV", default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<CsvInput>,
    #[serde(rename = "JSON", default, skip_serializing_if = "Option::is_none")]
    pub json: Option<JsonInput>,
    #[serde(rename = "Parquet", default, skip_serializing_if = "Option::is_none")]
    pub parquet: Option<ParquetInput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Csv(CsvInput),
    Json(JsonInput),
    Parquet,
}

/// Validated input format: one compression type and exactly one source format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "InputFormatRecord", into = "InputFormatRecord")]
pub struct InputFormat {
    compression: CompressionType,
    source: InputSource,
}

impl InputFormat {
    /// Validate a combination of optional formats; exactly one must be set.
    pub fn new(
        compression: CompressionType,
        csv: Option<CsvInput>,
        json: Option<JsonInput>,
        parquet: Option<ParquetInput>,
    ) -> Result<Self> {
        let chosen = [csv.is_some(), json.is_some(), parquet.is_some()]
            .iter()
            .filter(|set| **set)
            .count();
        if chosen != 1 {
            return Err(Error::Config(format!(
                "input format must set exactly one of CSV, JSON, Parquet (got {chosen})"
            )));
        }
        let source = match (csv, json) {
            (Some(csv), _) => InputSource::Csv(csv),
            (_, Some(json)) => InputSource::Json(json),
            _ => InputSource::Parquet,
        };
        Ok(Self {
            compression,
            source,
        })
    }

    pub fn csv(csv: CsvInput) -> Self {
        Self {
            compression: CompressionType::None,
            source: InputSource::Csv(csv),
        }
    }

    pub fn json(json_type: JsonType) -> Self {
        Self {
            compression: CompressionType::None,
            source: InputSource::Json(JsonInput { json_type }),
        }
    }

    pub fn parquet() -> Self {
        Self {
            compression: CompressionType::None,
            source: InputSource::Parquet,
        }
    }

    pub fn with_compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    pub fn compression(&self) -> CompressionType {
        self.compression
    }

    pub fn source(&self) -> &InputSource {
        &self.source
    }

    /// Plain key/value shape handed to the query collaborator.
    pub fn to_params(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(InputFormatRecord::from(self.clone()))?)
    }
}

impl Default for InputFormat {
    fn default() -> Self {
        InputFormat::json(JsonType::Document)
    }
}

impl TryFrom<InputFormatRecord> for InputFormat {
    type Error = Error;

    fn try_from(rec: InputFormatRecord) -> Result<Self> {
        InputFormat::new(rec.compression_type, rec.csv, rec.json, rec.parquet)
    }
}

impl From<InputFormat> for InputFormatRecord {
    fn from(fmt: InputFormat) -> Self {
        let mut rec = InputFormatRecord {
            compression_type: fmt.compression,
            ..Default::default()
        };
        match fmt.source {
            InputSource::Csv(csv) => rec.csv = Some(csv),
            InputSource::Json(json) => rec.json = Some(json),
            InputSource::Parquet => rec.parquet = Some(ParquetInput {}),
        }
        rec
    }
}

// --- output ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct CsvOutput {
    #[serde(default)]
    pub quote_fields: QuoteFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_escape_character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_delimiter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_character: Option<String>,
}

impl CsvOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote_fields(mut self, quote_fields: QuoteFields) -> Self {
        self.quote_fields = quote_fields;
        self
    }

    pub fn with_quote_escape_character(mut self, c: impl Into<String>) -> Self {
        self.quote_escape_character = Some(c.into());
        self
    }

    pub fn with_record_delimiter(mut self, d: impl Into<String>) -> Self {
        self.record_delimiter = Some(d.into());
        self
    }

    pub fn with_field_delimiter(mut self, d: impl Into<String>) -> Self {
        self.field_delimiter = Some(d.into());
        self
    }

    pub fn with_quote_character(mut self, c: impl Into<String>) -> Self {
        self.quote_character = Some(c.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
pub struct JsonOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_delimiter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputFormatRecord {
    #[serde(rename = "CSV", default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<CsvOutput>,
    #[serde(rename = "JSON", default, skip_serializing_if = "Option::is_none")]
    pub json: Option<JsonOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormatKind {
    Csv(CsvOutput),
    Json(JsonOutput),
}

/// Validated output format: exactly one of CSV or JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OutputFormatRecord", into = "OutputFormatRecord")]
pub struct OutputFormat {
    kind: OutputFormatKind,
}

impl OutputFormat {
    pub fn new(csv: Option<CsvOutput>, json: Option<JsonOutput>) -> Result<Self> {
        match (csv, json) {
            (Some(csv), None) => Ok(Self::csv(csv)),
            (None, Some(json)) => Ok(Self::json(json)),
            (csv, json) => Err(Error::Config(format!(
                "output format must set exactly one of CSV, JSON (got {})",
                csv.is_some() as usize + json.is_some() as usize
            ))),
        }
    }

    pub fn csv(csv: CsvOutput) -> Self {
        Self {
            kind: OutputFormatKind::Csv(csv),
        }
    }

    pub fn json(json: JsonOutput) -> Self {
        Self {
            kind: OutputFormatKind::Json(json),
        }
    }

    pub fn kind(&self) -> &OutputFormatKind {
        &self.kind
    }

    pub fn to_params(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(OutputFormatRecord::from(self.clone()))?)
    }
}

impl Default for OutputFormat {
    /// Newline-delimited JSON records.
    fn default() -> Self {
        OutputFormat::json(JsonOutput {
            record_delimiter: Some("\n".to_string()),
        })
    }
}

impl TryFrom<OutputFormatRecord> for OutputFormat {
    type Error = Error;

    fn try_from(rec: OutputFormatRecord) -> Result<Self> {
        OutputFormat::new(rec.csv, rec.json)
    }
}

impl From<OutputFormat> for OutputFormatRecord {
    fn from(fmt: OutputFormat) -> Self {
        match fmt.kind {
            OutputFormatKind::Csv(csv) => OutputFormatRecord {
                csv: Some(csv),
                json: None,
            },
            OutputFormatKind::Json(json) => OutputFormatRecord {
                csv: None,
                json: Some(json),
            },
        }
    }
}
