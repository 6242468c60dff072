use anyhow::Result;
use oca_ds_validator::core::ConfigProvider;
use oca_ds_validator::domain::model::{AttributeIssue, BundleWarning};
use oca_ds_validator::{
    DataSet, LocalStorage, OcaBundle, OcaError, ValidateOptions, ValidationEngine,
    ValidationReport,
};
use serde_json::json;
use std::io::Write;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn cattle_bundle() -> serde_json::Value {
    json!({
        "capture_base": {
            "type": "spec/capture_base/1.0",
            "attributes": {
                "Animal_ID": "Numeric",
                "Breed": "Text",
                "Birth_date": "DateTime",
                "Weights": "Array[Numeric]"
            },
            "flagged_attributes": []
        },
        "overlays": {
            "format": {
                "type": "spec/overlays/format/1.0",
                "attribute_formats": {
                    "Animal_ID": "^[0-9]+$",
                    "Breed": "[A-Z]{15}",
                    "Birth_date": "YYYY-MM-DD",
                    "Weights": "^[0-9]+$"
                }
            },
            "conformance": {
                "type": "spec/overlays/conformance/1.0",
                "attribute_conformance": {"Animal_ID": "M", "Breed": "O", "Birth_date": "O", "Weights": "O"}
            },
            "entry_code": {
                "type": "spec/overlays/entry_code/1.0",
                "attribute_entry_codes": {"Breed": ["Holstein", "Jersey", "Angus"]}
            },
            "character_encoding": {
                "type": "spec/overlays/character_encoding/1.0",
                "default_character_encoding": "utf-8",
                "attribute_character_encoding": {}
            }
        }
    })
}

const CATTLE_CSV: &str = "Animal_ID,Breed,Birth_date,Weights\n\
1,Holstein,2021-03-04,\"[410, 455]\"\n\
2,Jersey,2021-02-30,[380]\n\
,Angus,2020-12-01,\n\
4,Hereford,2022-01-15,\"[1, 2.5]\"\n\
5,Jersey,2022-06-01,[500]\n";

struct TestConfig {
    bundle: String,
    data_set: String,
    report: Option<String>,
    encoding: String,
}

impl ConfigProvider for TestConfig {
    fn bundle_path(&self) -> &str {
        &self.bundle
    }
    fn data_set_path(&self) -> &str {
        &self.data_set
    }
    fn report_path(&self) -> Option<&str> {
        self.report.as_deref()
    }
    fn error_threshold(&self) -> usize {
        5
    }
    fn show_data_preview(&self) -> bool {
        true
    }
    fn preview_rows(&self) -> usize {
        3
    }
    fn oca_version(&self) -> &str {
        "1.0"
    }
    fn default_encoding(&self) -> &str {
        &self.encoding
    }
    fn enable_flagged_alarm(&self) -> bool {
        true
    }
    fn enable_version_alarm(&self) -> bool {
        true
    }
}

fn write_fixture(dir: &TempDir, name: &str, content: &[u8]) -> Result<()> {
    std::fs::write(dir.path().join(name), content)?;
    Ok(())
}

#[tokio::test]
async fn test_end_to_end_validation_writes_report() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_fixture(&temp_dir, "bundle.json", cattle_bundle().to_string().as_bytes())?;
    write_fixture(&temp_dir, "cattle.csv", CATTLE_CSV.as_bytes())?;

    let config = TestConfig {
        bundle: "bundle.json".to_string(),
        data_set: "cattle.csv".to_string(),
        report: Some("out/report.json".to_string()),
        encoding: "utf-8".to_string(),
    };
    let engine = ValidationEngine::new(LocalStorage::new(temp_dir.path()), config);
    let report = engine.run().await?;

    assert!(!report.is_valid());
    assert!(report.attribute_errors.is_empty());
    assert!(report.warnings.is_empty());
    assert_eq!(report.rows_checked, 5);

    // Every Breed value fails the entry code format, as the pattern expects 15 capitals.
    assert_eq!(report.format_errors["Breed"].len(), 5);
    assert!(report.format_errors["Breed"][&0].contains("Entry code format mismatch"));
    assert_eq!(report.entry_code_errors["Breed"].len(), 1);
    assert!(report.entry_code_errors["Breed"].contains_key(&3));

    assert_eq!(report.format_errors["Animal_ID"][&2], "Missing mandatory attribute.");
    assert!(report.format_errors["Birth_date"].contains_key(&1));
    assert!(report.format_errors["Weights"].contains_key(&3));
    assert!(!report.format_errors["Weights"].contains_key(&2));

    assert_eq!(
        report.overview(5),
        "Found 5 problematic row(s) in the following attribute(s): {'Animal_ID', 'Birth_date', 'Breed', 'Weights'}"
    );

    let saved = std::fs::read(temp_dir.path().join("out/report.json"))?;
    let saved: ValidationReport = serde_json::from_slice(&saved)?;
    assert_eq!(saved, report);
    Ok(())
}

#[tokio::test]
async fn test_zip_bundle_matches_json_bundle() -> Result<()> {
    let bundle = cattle_bundle();
    let temp_dir = TempDir::new()?;

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.start_file("meta.json", options)?;
    zip.write_all(
        json!({
            "root": "ECB",
            "files": {"ECB": {"format": "EFMT", "conformance": "ECNF", "entry_code": "EENC"}}
        })
        .to_string()
        .as_bytes(),
    )?;
    for (file, key) in [
        ("ECB.json", None),
        ("EFMT.json", Some("format")),
        ("ECNF.json", Some("conformance")),
        ("EENC.json", Some("entry_code")),
    ] {
        let content = match key {
            None => bundle["capture_base"].to_string(),
            Some(key) => bundle["overlays"][key].to_string(),
        };
        zip.start_file(file, options)?;
        zip.write_all(content.as_bytes())?;
    }
    let zip_bytes = zip.finish()?.into_inner();
    write_fixture(&temp_dir, "bundle.zip", &zip_bytes)?;
    write_fixture(&temp_dir, "cattle.csv", CATTLE_CSV.as_bytes())?;

    let from_zip = OcaBundle::from_path(temp_dir.path().join("bundle.zip"))?;
    let from_json = OcaBundle::from_bytes(bundle.to_string().as_bytes())?;
    assert_eq!(from_zip.attributes(), from_json.attributes());
    assert_eq!(from_zip.entry_codes(), from_json.entry_codes());
    assert_eq!(from_zip.attribute_format("Breed"), Some("[A-Z]{15}"));
    assert!(from_zip.overlay("capture_base").is_ok());

    let data_set = DataSet::from_path(temp_dir.path().join("cattle.csv"))?;
    let options = ValidateOptions::default();
    let zip_report = from_zip.validate(&data_set, &options)?;
    let json_report = from_json.validate(&data_set, &options)?;
    assert_eq!(zip_report.format_errors, json_report.format_errors);
    assert_eq!(zip_report.entry_code_errors, json_report.entry_code_errors);
    Ok(())
}

#[tokio::test]
async fn test_attribute_mismatch_and_warnings() -> Result<()> {
    let mut bundle = cattle_bundle();
    bundle["capture_base"]["flagged_attributes"] = json!(["Animal_ID"]);
    bundle["overlays"]["format"]["type"] = json!("spec/overlays/format/0.1");

    let temp_dir = TempDir::new()?;
    write_fixture(&temp_dir, "bundle.json", bundle.to_string().as_bytes())?;
    write_fixture(&temp_dir, "herd.tsv", b"Animal_ID\tBreed\tColour\n7\tJersey\tbrown\n")?;

    let config = TestConfig {
        bundle: "bundle.json".to_string(),
        data_set: "herd.tsv".to_string(),
        report: None,
        encoding: "utf-8".to_string(),
    };
    let report = ValidationEngine::new(LocalStorage::new(temp_dir.path()), config)
        .run()
        .await?;

    let issues: Vec<(&str, AttributeIssue)> = report
        .attribute_errors
        .iter()
        .map(|e| (e.attribute.as_str(), e.issue))
        .collect();
    assert_eq!(
        issues,
        vec![
            ("Colour", AttributeIssue::Unmatched),
            ("Birth_date", AttributeIssue::Missing),
            ("Weights", AttributeIssue::Missing),
        ]
    );
    assert_eq!(
        report.warnings,
        vec![
            BundleWarning::FlaggedAttribute {
                attribute: "Animal_ID".to_string()
            },
            BundleWarning::VersionMismatch {
                overlay: "format".to_string(),
                version: "0.1".to_string()
            },
        ]
    );
    assert_eq!(
        report.overview(5),
        "Attribute error found. {'Birth_date', 'Weights'} found in the OCA Bundle but not in the data set; {'Colour'} found in the data set but not in the OCA Bundle.\n\
Found 1 problematic row(s) in the following attribute(s): {'Breed'}"
    );
    Ok(())
}

#[tokio::test]
async fn test_excel_data_set_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_fixture(&temp_dir, "bundle.json", cattle_bundle().to_string().as_bytes())?;
    write_fixture(&temp_dir, "entry.xlsx", b"PK")?;

    let config = TestConfig {
        bundle: "bundle.json".to_string(),
        data_set: "entry.xlsx".to_string(),
        report: None,
        encoding: "utf-8".to_string(),
    };
    let err = ValidationEngine::new(LocalStorage::new(temp_dir.path()), config)
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, OcaError::UnsupportedFileType { .. }));
    Ok(())
}

#[test]
fn test_valid_data_set_reports_no_error() -> Result<()> {
    let bundle = OcaBundle::from_bytes(cattle_bundle().to_string().as_bytes())?;
    let data_set = DataSet::from_bytes(
        b"Animal_ID,Breed,Birth_date,Weights\n1,HOLSTEINHOLSTEI,2021-03-04,[1]\n",
        b',',
    )?;
    let mut bundle_codes = cattle_bundle();
    bundle_codes["overlays"]["entry_code"]["attribute_entry_codes"]["Breed"] =
        json!(["HOLSTEINHOLSTEI"]);
    let bundle_with_codes = OcaBundle::from_bytes(bundle_codes.to_string().as_bytes())?;

    let report = bundle.validate(&data_set, &ValidateOptions::default())?;
    assert_eq!(report.entry_code_errors["Breed"].len(), 1);

    let report = bundle_with_codes.validate(&data_set, &ValidateOptions::default())?;
    assert!(report.is_valid());
    assert_eq!(report.overview(5), "No error was found.");
    Ok(())
}

#[tokio::test]
async fn test_default_encoding_applies_without_encoding_overlay() -> Result<()> {
    let mut bundle = cattle_bundle();
    bundle["overlays"]
        .as_object_mut()
        .unwrap()
        .remove("character_encoding");
    bundle["overlays"]["format"]["attribute_formats"]["Breed"] = json!("");

    let temp_dir = TempDir::new()?;
    write_fixture(&temp_dir, "bundle.json", bundle.to_string().as_bytes())?;
    write_fixture(&temp_dir, "herd.csv", b"Animal_ID,Breed\n1,Qu\xe9bec\n")?;

    let run = |encoding: &str| {
        let config = TestConfig {
            bundle: "bundle.json".to_string(),
            data_set: "herd.csv".to_string(),
            report: None,
            encoding: encoding.to_string(),
        };
        ValidationEngine::new(LocalStorage::new(temp_dir.path()), config)
    };

    let report = run("utf-8").run().await?;
    assert_eq!(
        report.encoding_errors["Breed"][&0],
        "Character encoding mismatch. Supported character encoding: utf-8."
    );

    let report = run("iso-8859-1").run().await?;
    assert!(report.encoding_errors["Breed"].is_empty());
    assert!(report.encoding_errors["Animal_ID"].is_empty());
    Ok(())
}
