use scatterq::aggregate;
use scatterq::prelude::*;
use serde_json::json;

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-20, "{a} != {b}");
}

#[test]
fn estimate_reference_value() {
    let cost = CostModel::default().estimate(100_000, 10_000, 10);
    assert_close(cost, 2.07007e-07);
}

#[test]
fn sum_cost_reference_value() {
    assert_eq!(sum_cost(&[1.0, 2.0, 3.0]), 6.0);
}

#[test]
fn dedicated_request_pricing_is_opt_in() {
    let model = CostModel::default().with_request_pricing(RequestPricing::Dedicated);
    let cost = model.estimate(100_000, 10_000, 10);
    let expected = 0.0007 / 1e9 * 10_000.0 + 0.0004 / 1000.0 * 10.0 + 0.002 / 1e9 * 100_000.0;
    assert_close(cost, expected);
    assert!(cost > CostModel::default().estimate(100_000, 10_000, 10));
}

#[test]
fn aggregate_reference_chunk() {
    let result = aggregate(vec![ChunkResult::new("test", ScanStats::new(30, 30, 10))]);
    assert_close(result.stats.cost, 6.77e-11);
    assert_eq!(result.stats.files_processed, 1);
}

#[test]
fn input_format_requires_exactly_one_source() {
    assert!(matches!(
        InputFormat::new(CompressionType::None, None, None, None),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        InputFormat::new(
            CompressionType::None,
            Some(CsvInput::new()),
            Some(JsonInput::default()),
            None
        ),
        Err(Error::Config(_))
    ));
    let parquet = InputFormat::new(CompressionType::None, None, None, Some(ParquetInput {})).unwrap();
    assert_eq!(
        parquet.to_params().unwrap(),
        json!({"CompressionType": "NONE", "Parquet": {}})
    );
}

#[test]
fn csv_input_shape() {
    let input = InputFormat::csv(
        CsvInput::new()
            .with_file_header_info(FileHeaderInfo::Use)
            .with_comments("#")
            .with_allow_quoted_record_delimiter(true),
    )
    .with_compression(CompressionType::Bzip2);
    assert_eq!(
        input.to_params().unwrap(),
        json!({
            "CompressionType": "BZIP2",
            "CSV": {
                "FileHeaderInfo": "USE",
                "Comments": "#",
                "AllowQuotedRecordDelimiter": true
            }
        })
    );
}

#[test]
fn default_formats_are_document_json() {
    assert_eq!(
        InputFormat::default().to_params().unwrap(),
        json!({"CompressionType": "NONE", "JSON": {"Type": "DOCUMENT"}})
    );
    assert_eq!(
        OutputFormat::default().to_params().unwrap(),
        json!({"JSON": {"RecordDelimiter": "\n"}})
    );
}

#[test]
fn output_format_requires_exactly_one_kind() {
    assert!(matches!(OutputFormat::new(None, None), Err(Error::Config(_))));
    assert!(matches!(
        OutputFormat::new(Some(CsvOutput::new()), Some(JsonOutput::default())),
        Err(Error::Config(_))
    ));
    let csv = OutputFormat::new(Some(CsvOutput::new()), None).unwrap();
    assert_eq!(
        csv.to_params().unwrap(),
        json!({"CSV": {"QuoteFields": "ASNEEDED"}})
    );
}

#[test]
fn out_of_enum_values_are_rejected() {
    assert!(matches!(
        "SOMETIMES".parse::<FileHeaderInfo>(),
        Err(Error::Config(_))
    ));
    let bad: std::result::Result<InputFormat, _> =
        serde_json::from_value(json!({"CSV": {"FileHeaderInfo": "SOMETIMES"}}));
    assert!(bad.is_err());
    let extra: std::result::Result<InputFormat, _> =
        serde_json::from_value(json!({"Parquet": {"x": 1}}));
    assert!(extra.is_err());
}
