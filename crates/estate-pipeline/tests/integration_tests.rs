//! Integration tests for the cleaning and feature-preparation pipeline.
//!
//! These tests drive the public API end to end against a small property-sales
//! fixture with one exact duplicate, gaps in numeric and text columns, one
//! unparseable sale date, and three non-informative columns.

use estate_pipeline::features::FeatureSchema;
use estate_pipeline::{
    DropReason, Pipeline, PipelineConfig, PipelineError, PipelineStage, PredictionResponse,
    Predictor, handle_prediction, load_dataset,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn house_sales() -> PathBuf {
    fixtures_path().join("house_sales.csv")
}

fn config_in(dir: &Path) -> PipelineConfig {
    PipelineConfig::builder()
        .source_path(house_sales())
        .output_path(dir.join("Cleaned_House_Data.csv"))
        .prepared_dir(dir.join("prepared"))
        .build()
        .unwrap()
}

fn read_csv(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .expect("Failed to create CSV reader")
        .finish()
        .expect("Failed to read CSV file")
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

const EXPECTED_FEATURES: [&str; 9] = [
    "Size",
    "Bedrooms",
    "Bathrooms",
    "Year Built",
    "Property_Age",
    "Location_CityB",
    "Location_CityC",
    "Date Sold_Year",
    "Date Sold_Month",
];

// ============================================================================
// Cleaning
// ============================================================================

#[test]
fn test_clean_house_sales_shape_and_columns() {
    let pipeline = Pipeline::builder().build().unwrap();
    let raw = load_dataset(&house_sales()).unwrap();
    assert_eq!(raw.shape(), (12, 10));

    let cleaned = pipeline.clean(raw).unwrap();

    assert_eq!(cleaned.data.shape(), (10, 8));
    assert_eq!(
        column_names(&cleaned.data),
        vec![
            "Date Sold",
            "Location",
            "Size",
            "Bedrooms",
            "Bathrooms",
            "Year Built",
            "Price",
            "Property_Age"
        ]
    );
    assert_eq!(cleaned.summary.duplicates_removed, 1);
    assert_eq!(cleaned.summary.invalid_dates_dropped, 1);
    assert_eq!(cleaned.summary.post_pruning_duplicates_removed, 0);
    assert_eq!(cleaned.summary.date_column.as_deref(), Some("Date Sold"));
    assert_eq!(cleaned.summary.year_built_column.as_deref(), Some("Year Built"));
    assert!(cleaned.summary.property_age_added);
    assert!(cleaned.summary.warnings.is_empty());
}

#[test]
fn test_clean_imputes_median_and_mode() {
    let pipeline = Pipeline::builder().build().unwrap();
    let cleaned = pipeline.clean(load_dataset(&house_sales()).unwrap()).unwrap();

    let fill_for = |column: &str| {
        cleaned
            .summary
            .imputations
            .iter()
            .find(|r| r.column == column)
            .and_then(|r| r.fill_value.clone())
    };
    assert_eq!(fill_for("Size").as_deref(), Some("1750"));
    assert_eq!(fill_for("Year Built").as_deref(), Some("1999"));
    assert_eq!(fill_for("Location").as_deref(), Some("CityA"));

    assert_eq!(cleaned.data.column("Size").unwrap().null_count(), 0);
    assert_eq!(cleaned.data.column("Location").unwrap().null_count(), 0);

    let locations = cleaned.data.column("Location").unwrap();
    let city_a = locations
        .str()
        .unwrap()
        .into_iter()
        .filter(|v| *v == Some("CityA"))
        .count();
    assert_eq!(city_a, 5);
}

#[test]
fn test_clean_converts_dates_and_derives_age() {
    let pipeline = Pipeline::builder().build().unwrap();
    let cleaned = pipeline.clean(load_dataset(&house_sales()).unwrap()).unwrap();

    assert_eq!(
        cleaned.data.column("Date Sold").unwrap().dtype(),
        &DataType::Date
    );

    let ages = cleaned.data.column("Property_Age").unwrap();
    assert_eq!(ages.dtype(), &DataType::Int64);
    assert_eq!(ages.null_count(), 0);
    // 2023 sales minus build years, with 1999 imputed for the missing one
    assert_eq!(ages.i64().unwrap().sum(), Some(260));
    assert_eq!(ages.i64().unwrap().min(), Some(8));
    assert_eq!(ages.i64().unwrap().max(), Some(48));
}

#[test]
fn test_clean_drops_uninformative_columns() {
    let pipeline = Pipeline::builder().build().unwrap();
    let cleaned = pipeline.clean(load_dataset(&house_sales()).unwrap()).unwrap();

    let mut dropped = cleaned.summary.dropped_column_names();
    dropped.sort_unstable();
    assert_eq!(dropped, vec!["Country", "ID", "Notes"]);

    let reason_for = |name: &str| {
        cleaned
            .summary
            .dropped_columns
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.reason)
    };
    assert_eq!(reason_for("ID"), Some(DropReason::RowIdentifier));
    assert_eq!(reason_for("Country"), Some(DropReason::Constant));
}

// ============================================================================
// Spreadsheet Input
// ============================================================================

fn house_sales_workbook() -> PathBuf {
    fixtures_path().join("house_sales.xlsx")
}

#[test]
fn test_load_first_worksheet_of_workbook() {
    let df = load_dataset(&house_sales_workbook()).unwrap();

    assert_eq!(df.shape(), (6, 8));
    assert_eq!(
        column_names(&df),
        vec![
            "ID",
            "Date Sold",
            "Location",
            "Size",
            "Bedrooms",
            "Bathrooms",
            "Year Built",
            "Price"
        ]
    );
    assert_eq!(df.column("Date Sold").unwrap().dtype(), &DataType::Date);
    assert_eq!(df.column("Date Sold").unwrap().null_count(), 1);
    assert_eq!(df.column("Size").unwrap().dtype(), &DataType::Int64);
    assert_eq!(df.column("Location").unwrap().dtype(), &DataType::String);
    assert_eq!(df.column("Location").unwrap().null_count(), 1);
}

#[test]
fn test_clean_workbook_fills_missing_sale_date_with_mode() {
    let pipeline = Pipeline::builder().build().unwrap();
    let cleaned = pipeline
        .clean(load_dataset(&house_sales_workbook()).unwrap())
        .unwrap();

    assert_eq!(cleaned.data.shape(), (6, 8));
    assert_eq!(cleaned.summary.invalid_dates_dropped, 0);
    assert_eq!(cleaned.summary.dropped_column_names(), vec!["ID"]);

    let date_fill = cleaned
        .summary
        .imputations
        .iter()
        .find(|r| r.column == "Date Sold")
        .expect("sale date imputed");
    assert_eq!(date_fill.fill_value.as_deref(), Some("2023-02-20"));
    assert_eq!(date_fill.filled, 1);

    // 2023 sale years; the row with the filled date was built in 2000
    let ages = cleaned.data.column("Property_Age").unwrap();
    assert_eq!(ages.i64().unwrap().sum(), Some(155));
}

// ============================================================================
// Full Run
// ============================================================================

#[test]
fn test_full_run_writes_every_artifact() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::builder().config(config_in(dir.path())).build().unwrap();

    let run = pipeline.run().unwrap();

    assert!(run.cleaned_path.exists());
    assert!(run.prepared_files.x_train.exists());
    assert!(run.prepared_files.x_test.exists());
    assert!(run.prepared_files.y_train.exists());
    assert!(run.prepared_files.y_test.exists());
    assert!(run.prepared_files.schema.exists());

    let cleaned = read_csv(&run.cleaned_path);
    assert_eq!(cleaned.shape(), (10, 8));

    assert_eq!(run.schema.features, EXPECTED_FEATURES.to_vec());
    assert_eq!(run.schema.train_rows, 8);
    assert_eq!(run.schema.test_rows, 2);
    assert_eq!(run.schema.datetime_columns, vec!["Date Sold"]);
    assert_eq!(run.schema.encodings.len(), 1);
    assert_eq!(run.schema.encodings[0].dropped_level, "CityA");

    let x_train = read_csv(&run.prepared_files.x_train);
    let y_train = read_csv(&run.prepared_files.y_train);
    let x_test = read_csv(&run.prepared_files.x_test);
    let y_test = read_csv(&run.prepared_files.y_test);
    assert_eq!(column_names(&x_train), EXPECTED_FEATURES.to_vec());
    assert_eq!(column_names(&y_train), vec!["Price"]);
    assert_eq!(x_train.height(), 8);
    assert_eq!(y_train.height(), 8);
    assert_eq!(x_test.height(), 2);
    assert_eq!(y_test.height(), 2);
}

#[test]
fn test_full_run_report_verifies_cleaning() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::builder().config(config_in(dir.path())).build().unwrap();

    let report = pipeline.run().unwrap().report;

    assert_eq!(report.verification.rows, 10);
    assert_eq!(report.verification.columns, 8);
    assert_eq!(report.verification.missing_values, 0);
    assert_eq!(report.verification.duplicate_rows, 0);

    assert!(report.features.categorical.contains(&"Location".to_string()));
    let target = report.target.expect("numeric target summary");
    assert_eq!(target.column, "Price");
    assert_eq!(target.min, 250000.0);
    assert_eq!(target.max, 620000.0);

    let first = &report.correlations[0];
    assert_eq!(first.column, "Price");
    assert!((first.correlation.unwrap() - 1.0).abs() < 1e-9);
    let size = report
        .correlations
        .iter()
        .find(|c| c.column == "Size")
        .and_then(|c| c.correlation)
        .unwrap();
    assert!(size > 0.9, "Size should track Price, got {size}");
}

#[test]
fn test_training_columns_are_standardized() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::builder().config(config_in(dir.path())).build().unwrap();

    let run = pipeline.run().unwrap();
    let x_train = read_csv(&run.prepared_files.x_train);

    for column in ["Size", "Bedrooms", "Bathrooms", "Year Built", "Property_Age"] {
        let mean = x_train
            .column(column)
            .unwrap()
            .as_materialized_series()
            .mean()
            .unwrap();
        assert!(mean.abs() < 1e-6, "{column} mean should be ~0, got {mean}");
    }

    let indicator = x_train.column("Location_CityB").unwrap().as_materialized_series();
    assert!(indicator.max::<i64>().unwrap().unwrap() <= 1);
}

#[test]
fn test_same_seed_gives_same_split() {
    let first_dir = TempDir::new().unwrap();
    let second_dir = TempDir::new().unwrap();

    let first = Pipeline::builder()
        .config(config_in(first_dir.path()))
        .build()
        .unwrap()
        .run()
        .unwrap();
    let second = Pipeline::builder()
        .config(config_in(second_dir.path()))
        .build()
        .unwrap()
        .run()
        .unwrap();

    let first_y = read_csv(&first.prepared_files.y_test);
    let second_y = read_csv(&second.prepared_files.y_test);
    assert!(first_y.equals(&second_y));
}

// ============================================================================
// Stage Events
// ============================================================================

#[test]
fn test_run_reports_stages_in_order() {
    let dir = TempDir::new().unwrap();
    let stages: Arc<Mutex<Vec<PipelineStage>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&stages);

    Pipeline::builder()
        .config(config_in(dir.path()))
        .on_event(move |event| sink.lock().unwrap().push(event.stage))
        .build()
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(
        *stages.lock().unwrap(),
        vec![
            PipelineStage::Load,
            PipelineStage::Deduplication,
            PipelineStage::Imputation,
            PipelineStage::DateNormalization,
            PipelineStage::FeatureConstruction,
            PipelineStage::Pruning,
            PipelineStage::Rededuplication,
            PipelineStage::Export,
            PipelineStage::Exploration,
            PipelineStage::Preparation,
        ]
    );
}

// ============================================================================
// Configuration Errors
// ============================================================================

#[test]
fn test_missing_source_is_load_error() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::builder()
        .source_path(dir.path().join("missing.xlsx"))
        .output_path(dir.path().join("out.csv"))
        .prepared_dir(dir.path().join("prepared"))
        .build()
        .unwrap();

    let err = Pipeline::builder().config(config).build().unwrap().run().unwrap_err();
    assert!(matches!(err, PipelineError::Load { .. }), "got {err:?}");
    assert!(!dir.path().join("out.csv").exists());
}

#[test]
fn test_unknown_target_is_configuration_error() {
    let pipeline = Pipeline::builder()
        .config(
            PipelineConfig::builder()
                .target_column("SalePrice")
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let cleaned = pipeline.clean(load_dataset(&house_sales()).unwrap()).unwrap();

    let err = pipeline.prepare(cleaned.data).unwrap_err();
    assert!(err.is_configuration(), "got {err:?}");
    assert!(err.to_string().contains("SalePrice"));
}

#[test]
fn test_run_failure_names_the_stage() {
    let dir = TempDir::new().unwrap();
    let config = PipelineConfig::builder()
        .source_path(house_sales())
        .output_path(dir.path().join("Cleaned_House_Data.csv"))
        .prepared_dir(dir.path().join("prepared"))
        .target_column("SalePrice")
        .build()
        .unwrap();

    let err = Pipeline::builder().config(config).build().unwrap().run().unwrap_err();

    assert!(err.is_configuration(), "got {err:?}");
    assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    assert!(err.to_string().starts_with("During feature preparation: "));
    // cleaning and export finished before the failure
    assert!(dir.path().join("Cleaned_House_Data.csv").exists());
    assert!(!dir.path().join("prepared").exists());
}

#[test]
fn test_absent_scaling_column_is_configuration_error() {
    let pipeline = Pipeline::builder()
        .config(
            PipelineConfig::builder()
                .scaling_columns(["Size", "Lot Size"])
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    let cleaned = pipeline.clean(load_dataset(&house_sales()).unwrap()).unwrap();

    let err = pipeline.prepare(cleaned.data).unwrap_err();
    assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    assert!(err.to_string().contains("Lot Size"));
}

// ============================================================================
// Serving Against a Written Schema
// ============================================================================

struct MeanPrice;

impl Predictor for MeanPrice {
    fn predict(&self, features: &[f64]) -> anyhow::Result<f64> {
        Ok(390000.0 + features.iter().sum::<f64>())
    }
}

#[test]
fn test_prediction_against_written_schema() {
    let dir = TempDir::new().unwrap();
    let run = Pipeline::builder()
        .config(config_in(dir.path()))
        .build()
        .unwrap()
        .run()
        .unwrap();

    let schema = FeatureSchema::from_json_file(&run.prepared_files.schema).unwrap();
    assert_eq!(schema.features, run.schema.features);
    assert_eq!(schema.encodings, run.schema.encodings);
    assert_eq!(schema.target, "Price");

    let body = serde_json::Value::Object(
        schema
            .features
            .iter()
            .map(|f| (f.clone(), serde_json::json!(0)))
            .collect(),
    )
    .to_string();
    assert_eq!(
        handle_prediction(&schema, &MeanPrice, &body),
        PredictionResponse::Success {
            predicted_price: 390000.0
        }
    );

    let partial = r#"{"Size": 0.1}"#;
    assert!(!handle_prediction(&schema, &MeanPrice, partial).is_success());
}
