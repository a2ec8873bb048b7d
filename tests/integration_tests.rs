use calcfu::domain::model::{GroupErrorPolicy, OutputFormat, ReportFormat, ResultRow};
use calcfu::{CliConfig, EtlEngine, EtlError, LocalStorage, ReportPipeline, TomlConfig};
use tempfile::TempDir;

const REPORT: &str = "\
DateTime,Sample ID,Plate Type,Dilution,Red Raw Count,Blue Raw Count,Red with Gas Raw Count
2021-06-01 10:00:00,101-1,AC,-2,212,-,-
2021-06-01 10:01:00,101-2,AC,-3,35,-,-
2021-06-01 10:02:00,102-1,PAC,-2,0,-,-
2021-06-01 10:03:00,102-2,PAC,-3,0,-,-
2021-06-01 10:04:00,x,PAC,-2,8,-,-
2021-06-01 10:05:00,103-1,VE,1:1,0,0,0
2021-06-01 10:06:00,104-1,RAC,-1,12,1,-
2021-06-01 10:07:00,104-2,RAC,-2,11,1,-
";

fn cli_config(input: String, output: String) -> CliConfig {
    CliConfig {
        input,
        output,
        format: ReportFormat::Reader,
        weighed: false,
        group_size: 0,
        plate_type: None,
        dilutions: vec![],
        significant_digits: 2,
        numeric: false,
        output_format: OutputFormat::Csv,
        on_group_error: GroupErrorPolicy::Skip,
        verbose: false,
        json_logs: false,
    }
}

#[tokio::test]
async fn test_end_to_end_reader_report() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("export.csv"), REPORT).unwrap();

    let config = cli_config("export.csv".to_string(), "out/results.csv".to_string());
    let storage = LocalStorage::new(temp_dir.path());
    let engine = EtlEngine::new(ReportPipeline::new(storage, config));

    let summary = engine.run().await.unwrap();
    assert_eq!(summary.plates, 6);
    assert_eq!(summary.groups, 3);
    assert_eq!(summary.failed_groups, 0);
    assert_eq!(summary.output_path, "out/results.csv");

    let mut reader = csv::Reader::from_path(temp_dir.path().join("out/results.csv")).unwrap();
    let rows: Vec<ResultRow> = reader.deserialize().map(|r| r.unwrap()).collect();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].cfu, "22,000 PAC / mL");
    assert_eq!(rows[0].counts, "212, 35");
    assert_eq!(rows[0].plates, "101-1, 101-2");
    assert_eq!(rows[0].date, "2021-06-01");
    assert_eq!(rows[1].cfu, "<25,000 ePAC / mL");
    // 13 at -1 is closest to the upper bound
    assert_eq!(rows[2].cfu, "<250 eRAC / mL");
    assert!(rows.iter().all(|r| r.error.is_empty()));
}

#[tokio::test]
async fn test_end_to_end_invalid_report() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("export.csv"),
        "Sample ID,Plate Type,Dilution,Red Raw Count\n1-1,PAC,-2,abc\n1-2,PAC,-3,10\n",
    )
    .unwrap();

    let config = cli_config("export.csv".to_string(), "results.csv".to_string());
    let engine = EtlEngine::new(ReportPipeline::new(
        LocalStorage::new(temp_dir.path()),
        config,
    ));

    let err = engine.run().await.unwrap_err();
    assert!(matches!(err, EtlError::ReaderError { .. }));
    assert!(err.to_string().contains("1-1"));
    assert!(!temp_dir.path().join("results.csv").exists());
}

#[tokio::test]
async fn test_end_to_end_toml_manual_sheet() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("manual.csv"),
        "Label,Type,Count,Dilution,NumberPlates\n\
         A,PAC,35,-3,1\n\
         B,PAC,212,-2,1\n\
         C,HSCC,81,0,1\n\
         D,HSCC,85,0,1\n",
    )
    .unwrap();

    let config = TomlConfig::from_toml_str(
        r#"
[run]
name = "manual"

[input]
path = "manual.csv"
format = "manual"

[grouping]
size = 2

[estimate]
mode = "numeric"

[output]
path = "results.json"
format = "json"
"#,
    )
    .unwrap();

    let engine = EtlEngine::new(ReportPipeline::new(
        LocalStorage::new(temp_dir.path()),
        config,
    ));
    let summary = engine.run().await.unwrap();
    assert_eq!(summary.groups, 2);

    let data = std::fs::read(temp_dir.path().join("results.json")).unwrap();
    let rows: Vec<ResultRow> = serde_json::from_slice(&data).unwrap();
    assert_eq!(rows[0].cfu, "22454");
    assert_eq!(rows[1].cfu, "83");
}
