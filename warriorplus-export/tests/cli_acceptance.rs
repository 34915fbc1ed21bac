use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn exports_dir(&self) -> PathBuf {
        self.xdg_data.join("warriorplus/exports")
    }

    fn write_config(&self, contents: &str) {
        let dir = self.xdg_config.join("warriorplus");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), contents).expect("failed to write config");
    }
}

fn snapshot_fixture() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../warriorplus-core/tests/fixtures/snapshot.json")
        .to_string_lossy()
        .into_owned()
}

fn run_export(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("warriorplus-export"));

    Command::new(bin_path)
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute warriorplus-export: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "warriorplus-export {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn exported_files(env: &CliTestEnv) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(env.exports_dir())
        .expect("exports dir should exist")
        .map(|entry| entry.expect("failed to read entry").path())
        .collect();
    files.sort();
    files
}

#[test]
fn export_writes_comprehensive_json_to_data_dir() {
    let env = CliTestEnv::new();
    let snapshot = snapshot_fixture();
    let args = ["--snapshot", snapshot.as_str(), "--window", "all"];

    let output = run_export(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Exported comprehensive report"),
        "expected export confirmation, got:\n{stdout}"
    );

    let files = exported_files(&env);
    assert_eq!(files.len(), 1, "expected one export file");
    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("comprehensive-report-all-"), "unexpected name {name}");
    assert!(name.ends_with("Z.json"), "unexpected name {name}");

    let content = fs::read_to_string(&files[0]).expect("failed to read export");
    let json: serde_json::Value = serde_json::from_str(&content).expect("export is not JSON");
    assert_eq!(json["rawData"]["totalUsers"], 3);
    assert_eq!(json["metadata"]["recordCounts"]["crisisEntries"], 4);
}

#[test]
fn export_pharmaceutical_csv_to_stdout() {
    let env = CliTestEnv::new();
    let snapshot = snapshot_fixture();
    let args = [
        "--snapshot",
        snapshot.as_str(),
        "--report",
        "pharmaceutical",
        "--window",
        "all",
        "--format",
        "csv",
        "--stdout",
    ];

    let output = run_export(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some(
            "Drug Name,Global Avg Efficacy,Global Patient Count,Global Side Effect %,\
             User Reported Effectiveness,Total User Reports,Risk Profile,Recommendation Level"
        )
    );
    assert_eq!(lines.filter(|line| !line.is_empty()).count(), 4);
    assert!(
        !env.exports_dir().exists(),
        "--stdout should not write an export file"
    );
}

#[test]
fn export_honors_output_dir_and_config_defaults() {
    let env = CliTestEnv::new();
    env.write_config(
        r#"
[export]
report_type = "hospital"
window = "all"
"#,
    );
    let out_dir = env.home.join("reports");
    let snapshot = snapshot_fixture();
    let out_arg = out_dir.to_string_lossy().into_owned();
    let args = ["--snapshot", snapshot.as_str(), "--output", out_arg.as_str()];

    let output = run_export(&env, &args);
    assert_success(&args, &output);

    let files: Vec<PathBuf> = fs::read_dir(&out_dir)
        .expect("output dir should exist")
        .map(|entry| entry.expect("failed to read entry").path())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("hospital-report-all-"), "unexpected name {name}");
}

#[test]
fn summary_lists_most_prescribed_medication() {
    let env = CliTestEnv::new();
    let snapshot = snapshot_fixture();
    let args = ["--snapshot", snapshot.as_str(), "--window", "all", "--summary"];

    let output = run_export(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("MEDICATION USAGE"));
    assert!(
        stdout.contains("Most prescribed: Hydroxyurea - 87 patients"),
        "expected usage summary, got:\n{stdout}"
    );
}

#[test]
fn unknown_format_is_rejected() {
    let env = CliTestEnv::new();
    let snapshot = snapshot_fixture();
    let args = ["--snapshot", snapshot.as_str(), "--format", "xml"];

    let output = run_export(&env, &args);
    assert!(!output.status.success(), "xml export should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unsupported export format: xml"),
        "expected format error, got:\n{stderr}"
    );
}

#[test]
fn export_partial_anonymization_to_stdout() {
    let env = CliTestEnv::new();
    let snapshot = snapshot_fixture();
    let args = [
        "--snapshot",
        snapshot.as_str(),
        "--report",
        "hospital",
        "--window",
        "all",
        "--anonymization",
        "partial",
        "--stdout",
    ];

    let output = run_export(&env, &args);
    assert_success(&args, &output);

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    assert_eq!(json["metadata"]["anonymization"], "partial");
    let ids: Vec<&str> = json["patientOutcomes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|o| o["userId"].as_str())
        .collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| id.starts_with("patient-")), "{ids:?}");
}

#[test]
fn export_defaults_to_full_anonymization() {
    let env = CliTestEnv::new();
    let snapshot = snapshot_fixture();
    let args = ["--snapshot", snapshot.as_str(), "--window", "all", "--stdout"];

    let output = run_export(&env, &args);
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"anonymization\": \"full\""));
    assert!(!stdout.contains("Amara"), "names should be stripped:\n{stdout}");
}

#[test]
fn unknown_anonymization_is_rejected() {
    let env = CliTestEnv::new();
    let snapshot = snapshot_fixture();
    let args = ["--snapshot", snapshot.as_str(), "--anonymization", "some"];

    let output = run_export(&env, &args);
    assert!(!output.status.success(), "unknown level should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid anonymization level: some"),
        "expected anonymization error, got:\n{stderr}"
    );
}

#[test]
fn custom_window_names_the_export_by_range() {
    let env = CliTestEnv::new();
    let snapshot = snapshot_fixture();
    let args = [
        "--snapshot",
        snapshot.as_str(),
        "--report",
        "raw",
        "--window",
        "2025-01-01..2025-03-31",
    ];

    let output = run_export(&env, &args);
    assert_success(&args, &output);

    let files = exported_files(&env);
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(
        name.starts_with("raw-report-custom-20250101-20250331-"),
        "unexpected name {name}"
    );

    let content = fs::read_to_string(&files[0]).expect("failed to read export");
    let json: serde_json::Value = serde_json::from_str(&content).expect("export is not JSON");
    assert_eq!(json["users"].as_array().unwrap().len(), 1);
}

#[test]
fn remote_export_requires_project() {
    let env = CliTestEnv::new();
    let args = ["--window", "all"];

    let output = run_export(&env, &args);
    assert!(!output.status.success(), "export without a store should fail");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("No Firestore project configured"),
        "expected store hint, got:\n{stderr}"
    );
    let log_path = env.xdg_state.join("warriorplus/warriorplus.log");
    assert!(
        stderr.contains(&format!("(log: {})", log_path.display())),
        "expected log location, got:\n{stderr}"
    );
}
