use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{self as sdk, SelectObjectContentEventStream};
use aws_sdk_s3::Client;
use scatterq_core::config::Scope;
use scatterq_core::error::{Error, Result};
use scatterq_core::format::{InputFormat, InputSource, OutputFormat, OutputFormatKind};
use scatterq_core::types::{ChunkResult, QueryRequest, ScanStats};
use tokio::runtime::Runtime;
use tracing::trace;

use super::client::{create_s3_client, S3Config};
use crate::connector::QueryClient;
use crate::events::{ChunkAssembler, SelectEvent};

/// One worker's S3 Select client. Never shared between workers.
pub struct S3SelectClient {
    runtime: Runtime,
    client: Client,
}

impl S3SelectClient {
    pub fn new(config: &S3Config) -> Result<Self> {
        let runtime = super::runtime()?;
        let client = runtime.block_on(create_s3_client(config));
        Ok(Self { runtime, client })
    }

    async fn select(
        &self,
        scope: &Scope,
        key: &str,
        request: &QueryRequest,
    ) -> Result<ChunkResult> {
        let mut output = self
            .client
            .select_object_content()
            .bucket(&scope.bucket)
            .key(key)
            .expression(&request.query)
            .expression_type(sdk::ExpressionType::Sql)
            .input_serialization(input_serialization(&request.input))
            .output_serialization(output_serialization(&request.output))
            .request_progress(sdk::RequestProgress::builder().enabled(true).build())
            .send()
            .await
            .map_err(|e| query_error(key, DisplayErrorContext(&e)))?;

        let mut assembler = ChunkAssembler::new();
        while let Some(event) = output
            .payload
            .recv()
            .await
            .map_err(|e| query_error(key, DisplayErrorContext(&e)))?
        {
            if let Some(event) = to_select_event(event) {
                assembler.push(key, event)?;
            }
        }
        trace!(key, frames = assembler.record_frames(), "select stream finished");
        assembler.finish(key)
    }
}

impl QueryClient for S3SelectClient {
    fn query(&self, scope: &Scope, key: &str, request: &QueryRequest) -> Result<ChunkResult> {
        self.runtime.block_on(self.select(scope, key, request))
    }
}

fn query_error(key: &str, err: impl std::fmt::Display) -> Error {
    Error::Query {
        key: key.to_string(),
        reason: err.to_string(),
    }
}

fn to_select_event(event: SelectObjectContentEventStream) -> Option<SelectEvent> {
    match event {
        SelectObjectContentEventStream::Records(records) => Some(SelectEvent::Records(
            records
                .payload()
                .map(|blob| blob.as_ref().to_vec())
                .unwrap_or_default(),
        )),
        SelectObjectContentEventStream::Stats(stats) => {
            let details = stats.details();
            Some(SelectEvent::Stats(ScanStats::new(
                non_negative(details.and_then(|d| d.bytes_scanned())),
                non_negative(details.and_then(|d| d.bytes_processed())),
                non_negative(details.and_then(|d| d.bytes_returned())),
            )))
        }
        SelectObjectContentEventStream::Progress(progress) => {
            let details = progress.details();
            Some(SelectEvent::Progress(ScanStats::new(
                non_negative(details.and_then(|d| d.bytes_scanned())),
                non_negative(details.and_then(|d| d.bytes_processed())),
                non_negative(details.and_then(|d| d.bytes_returned())),
            )))
        }
        SelectObjectContentEventStream::Cont(_) => Some(SelectEvent::Continuation),
        SelectObjectContentEventStream::End(_) => Some(SelectEvent::End),
        _ => None,
    }
}

fn non_negative(v: Option<i64>) -> u64 {
    v.unwrap_or(0).max(0) as u64
}

/// Translate a validated input format into the SDK shape.
pub fn input_serialization(input: &InputFormat) -> sdk::InputSerialization {
    let builder = sdk::InputSerialization::builder()
        .compression_type(sdk::CompressionType::from(input.compression().as_str()));
    match input.source() {
        InputSource::Csv(csv) => builder
            .csv(
                sdk::CsvInput::builder()
                    .set_file_header_info(
                        csv.file_header_info
                            .map(|h| sdk::FileHeaderInfo::from(h.as_str())),
                    )
                    .set_comments(csv.comments.clone())
                    .set_quote_escape_character(csv.quote_escape_character.clone())
                    .set_record_delimiter(csv.record_delimiter.clone())
                    .set_field_delimiter(csv.field_delimiter.clone())
                    .set_quote_character(csv.quote_character.clone())
                    .set_allow_quoted_record_delimiter(csv.allow_quoted_record_delimiter)
                    .build(),
            )
            .build(),
        InputSource::Json(json) => builder
            .json(
                sdk::JsonInput::builder()
                    .r#type(sdk::JsonType::from(json.json_type.as_str()))
                    .build(),
            )
            .build(),
        InputSource::Parquet => builder.parquet(sdk::ParquetInput::builder().build()).build(),
    }
}

pub fn output_serialization(output: &OutputFormat) -> sdk::OutputSerialization {
    match output.kind() {
        OutputFormatKind::Csv(csv) => sdk::OutputSerialization::builder()
            .csv(
                sdk::CsvOutput::builder()
                    .quote_fields(sdk::QuoteFields::from(csv.quote_fields.as_str()))
                    .set_quote_escape_character(csv.quote_escape_character.clone())
                    .set_record_delimiter(csv.record_delimiter.clone())
                    .set_field_delimiter(csv.field_delimiter.clone())
                    .set_quote_character(csv.quote_character.clone())
                    .build(),
            )
            .build(),
        OutputFormatKind::Json(json) => sdk::OutputSerialization::builder()
            .json(
                sdk::JsonOutput::builder()
                    .set_record_delimiter(json.record_delimiter.clone())
                    .build(),
            )
            .build(),
    }
}
