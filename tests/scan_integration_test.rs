use declscan::{CliConfig, HeaderPipeline, LocalStorage, ScanEngine};
use std::fs;
use tempfile::TempDir;

const FRAMEWORK_HEADER: &str = "\
#pragma once
#define ICoreFramework int
namespace spark {
    template <class T>
    class handle {
        T a;
    };
    using ms_time_t = long;
}
class IViewModel {};
class IService {};
template <class T>
class NotificationHelper {
    T callbacks;
};
";

const MODEL_HEADER: &str = "\
#pragma once
#include \"Interfaces.h\"
class PresenceRecord {
public:
    int state = 0;
    double lastSeen;
    bool muted = false;
    spark::ms_time_t updatedAt = 0;
};

enum class PresenceState { Offline = 0, Online, Away };
";

const VIEWMODEL_HEADER: &str = "\
#pragma once
#include \"Interfaces.h\"
class RosterEvents {
public:
    virtual void onRosterChanged(int count) = 0;
};

class RosterViewModel : public IViewModel, public NotificationHelper<RosterEvents> {
public:
    virtual void CreateInstance(const spark::handle<ICoreFramework>& core, const int& capacity);
    virtual void setFilter(int mode) = 0;
    virtual double getLoadFactor(void) = 0;
};
";

const SERVICE_HEADER: &str = "\
#pragma once
#include \"Interfaces.h\"
class PresenceService : public IService {
public:
    [[clang::annotate(\"generate_binds\")]]
    virtual void publish(int state) = 0;
    virtual double* snapshot(float window) = 0;
};
";

fn write_fixture_tree(root: &std::path::Path) {
    fs::create_dir_all(root.join("framework")).unwrap();
    fs::create_dir_all(root.join("src/model")).unwrap();
    fs::create_dir_all(root.join("src/viewmodel")).unwrap();
    fs::create_dir_all(root.join("src/service")).unwrap();

    fs::write(root.join("framework/Interfaces.h"), FRAMEWORK_HEADER).unwrap();
    fs::write(root.join("src/model/Presence.h"), MODEL_HEADER).unwrap();
    fs::write(root.join("src/viewmodel/Roster.h"), VIEWMODEL_HEADER).unwrap();
    fs::write(root.join("src/service/Presence.h"), SERVICE_HEADER).unwrap();
}

fn scan_config(root: &std::path::Path) -> CliConfig {
    CliConfig {
        headers: vec![
            "src/model/Presence.h".to_string(),
            "src/viewmodel/Roster.h".to_string(),
            "src/service/Presence.h".to_string(),
        ],
        include_paths: vec!["framework".to_string()],
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
    }
}

#[tokio::test]
async fn end_to_end_scan_produces_a_classified_manifest() {
    let temp_dir = TempDir::new().unwrap();
    write_fixture_tree(temp_dir.path());

    let config = scan_config(temp_dir.path());
    let storage = LocalStorage::new(config.scan_root.clone());
    let pipeline = HeaderPipeline::new(storage, config);
    let engine = ScanEngine::new(pipeline);

    let result = engine.run().await;
    assert!(result.is_ok(), "scan failed: {:?}", result.err());

    let manifest_path = temp_dir.path().join("output/manifest.json");
    assert!(manifest_path.exists());

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();

    // Model: fields flattened with the platform time type substituted.
    let models = manifest["models"].as_array().unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0]["model name"], "PresenceRecord");
    assert_eq!(models[0]["def header"], "src/model/Presence.h");
    assert_eq!(models[0]["fields"]["updatedAt"]["type"], "time_t");
    assert_eq!(models[0]["fields"]["state"]["type"], "int");

    // Enum with contiguous constants.
    let enums = manifest["enums"].as_array().unwrap();
    assert_eq!(enums.len(), 1);
    assert_eq!(enums[0]["enum name"], "PresenceState");
    assert_eq!(enums[0]["constants"]["Online"], 1);

    // Viewmodel: factory params keep their container and qualifiers, the
    // callback interface is folded in rather than emitted standalone.
    let viewmodels = manifest["viewmodels"].as_array().unwrap();
    assert_eq!(viewmodels.len(), 1);
    let vm = &viewmodels[0];
    assert_eq!(vm["viewmodel"], "RosterViewModel");
    assert_eq!(vm["base"], "IViewModel");
    let core_param = &vm["apis"]["CreateInstance"]["params"]["core"];
    assert_eq!(core_param["type"], "int");
    assert_eq!(core_param["container"], "spark::handle");
    assert_eq!(core_param["traits"], "const &");
    assert_eq!(
        vm["apis"]["getLoadFactor"]["returns"]["type"],
        "double"
    );
    assert!(vm["callback apis"]["onRosterChanged"].is_object());

    // Service: only the annotated API is exposed.
    let services = manifest["services"].as_array().unwrap();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0]["service"], "PresenceService");
    assert!(services[0]["apis"]["publish"].is_object());
    assert!(services[0]["apis"]["snapshot"].is_null());

    // The callback interface never appears as its own entity.
    assert!(manifest["viewmodels"]
        .as_array()
        .unwrap()
        .iter()
        .all(|v| v["viewmodel"] != "RosterEvents"));
}

#[tokio::test]
async fn missing_quoted_include_fails_the_scan() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    fs::write(
        temp_dir.path().join("src/Broken.h"),
        "#include \"DoesNotExist.h\"\nclass Broken {};\n",
    )
    .unwrap();

    let mut config = scan_config(temp_dir.path());
    config.headers = vec!["src/Broken.h".to_string()];

    let storage = LocalStorage::new(config.scan_root.clone());
    let pipeline = HeaderPipeline::new(storage, config);
    let engine = ScanEngine::new(pipeline);

    let err = engine.run().await.unwrap_err();
    assert!(err.to_string().contains("DoesNotExist.h"));
}

#[tokio::test]
async fn syntax_errors_carry_the_offending_location() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    fs::write(
        temp_dir.path().join("src/Bad.h"),
        "class Bad {\npublic:\n    int = 5;\n};\n",
    )
    .unwrap();

    let mut config = scan_config(temp_dir.path());
    config.headers = vec!["src/Bad.h".to_string()];

    let storage = LocalStorage::new(config.scan_root.clone());
    let pipeline = HeaderPipeline::new(storage, config);
    let engine = ScanEngine::new(pipeline);

    let err = engine.run().await.unwrap_err();
    assert!(err.to_string().contains("src/Bad.h:3:"));
}
