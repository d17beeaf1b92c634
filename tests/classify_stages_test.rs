//! Drives the pipeline stage by stage over headers that do not classify
//! cleanly: near-miss shapes, explicit-codegen headers and private records.

use declscan::domain::ports::Pipeline;
use declscan::{CliConfig, HeaderPipeline, LocalStorage};
use std::fs;
use tempfile::TempDir;

fn pipeline_for(root: &std::path::Path, headers: &[&str]) -> HeaderPipeline<LocalStorage, CliConfig> {
    let config = CliConfig {
        headers: headers.iter().map(|h| h.to_string()).collect(),
        include_paths: vec![],
        defines: vec![],
        scan_root: root.to_str().unwrap().to_string(),
        output_path: "output".to_string(),
        manifest_name: "manifest.json".to_string(),
        platform_time_type: "time_t".to_string(),
        init_exempt: vec![],
        strict: false,
        suppress_errors: false,
        compact: false,
        verbose: false,
    };
    let storage = LocalStorage::new(config.scan_root.clone());
    HeaderPipeline::new(storage, config)
}

#[tokio::test]
async fn private_record_with_accessors_stays_unclassified() {
    // A record keeping its fields private with a stray getter/setter pair
    // matches neither the model nor the viewmodel shape.
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    fs::write(
        temp_dir.path().join("src/Plain.h"),
        "class Plain {\n\
         private:\n\
             char c = 'a';\n\
             float b = 4.2;\n\
             int a = 3;\n\
             double d;\n\
             bool x = false;\n\
         public:\n\
             int getA(void);\n\
             void setB(float b);\n\
         };\n",
    )
    .unwrap();

    let pipeline = pipeline_for(temp_dir.path(), &["src/Plain.h"]);
    let entities = pipeline.extract().await.unwrap();
    assert_eq!(entities.len(), 1);

    let result = pipeline.transform(entities).await.unwrap();
    assert_eq!(result.manifest.total_entities(), 0);
    assert_eq!(result.unclassified, vec!["Plain".to_string()]);
}

#[tokio::test]
async fn overloaded_service_operations_survive_extraction() {
    // Operations split by parameter type, one returning an owned pointer;
    // both overloads are lifted even though they share a name.
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    fs::write(
        temp_dir.path().join("src/Meter.h"),
        "class IService {};\n\
         class MeterService : public IService {\n\
         public:\n\
             virtual void CreateInstance(const int& scale);\n\
             virtual void record(int sample) = 0;\n\
             virtual double* record(float sample) = 0;\n\
         };\n",
    )
    .unwrap();

    let pipeline = pipeline_for(temp_dir.path(), &["src/Meter.h"]);
    let entities = pipeline.extract().await.unwrap();

    let meter = entities
        .iter()
        .find_map(|e| match e {
            declscan::domain::model::Entity::Class(c) if c.name == "MeterService" => Some(c),
            _ => None,
        })
        .expect("MeterService should be composed");
    let record_overloads: Vec<_> = meter.methods.iter().filter(|m| m.name == "record").collect();
    assert_eq!(record_overloads.len(), 2);
    assert_eq!(
        record_overloads[0].returns.type_info.name(),
        "void"
    );
    assert_eq!(record_overloads[1].returns.type_info.name(), "double");
    assert_eq!(
        record_overloads[1].returns.traits.ref_kind,
        Some(declscan::domain::model::RefKind::Pointer)
    );

    let result = pipeline.transform(entities).await.unwrap();
    assert_eq!(result.manifest.services.len(), 1);
}

#[tokio::test]
async fn explicit_codegen_header_keeps_only_annotated_entities() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    fs::write(
        temp_dir.path().join("src/Records.h"),
        "[[clang::annotate(\"explicit_codegen\")]]\n\
         class ExportedRecord {\n\
         public:\n\
             int id = 0;\n\
         };\n\
         class HiddenRecord {\n\
         public:\n\
             int id = 0;\n\
         };\n",
    )
    .unwrap();

    let pipeline = pipeline_for(temp_dir.path(), &["src/Records.h"]);
    let entities = pipeline.extract().await.unwrap();
    assert_eq!(entities.len(), 2);

    let result = pipeline.transform(entities).await.unwrap();
    let names: Vec<&str> = result
        .manifest
        .models
        .iter()
        .map(|m| m.ty.name.as_str())
        .collect();
    assert_eq!(names, vec!["ExportedRecord"]);
}

#[tokio::test]
async fn callbacks_are_reported_but_not_emitted() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    fs::write(
        temp_dir.path().join("src/Events.h"),
        "class RosterEvents {\n\
         public:\n\
             virtual void onRosterChanged(int count) = 0;\n\
             virtual void onRosterCleared() = 0;\n\
         };\n",
    )
    .unwrap();

    let pipeline = pipeline_for(temp_dir.path(), &["src/Events.h"]);
    let entities = pipeline.extract().await.unwrap();
    let result = pipeline.transform(entities).await.unwrap();

    assert_eq!(result.manifest.total_entities(), 0);
    assert_eq!(result.ignored_callbacks, vec!["RosterEvents".to_string()]);
    assert!(result.unclassified.is_empty());
}
