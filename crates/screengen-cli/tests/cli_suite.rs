use std::process::Command;

const PROJECT: &str = r#"{
  "name": "bench",
  "device_model": "trmnl",
  "pages": [
    {
      "name": "Home",
      "widgets": [
        { "id": "w1", "type": "text", "x": 0, "y": 0, "width": 120, "height": 24,
          "props": { "text": "Hello" } }
      ]
    }
  ]
}"#;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_screengen")
}

#[test]
fn compiles_a_project_to_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("project.json");
    let output = dir.path().join("device.yaml");
    std::fs::write(&input, PROJECT).expect("write project");

    let status = Command::new(bin())
        .args([
            input.to_string_lossy().as_ref(),
            "--output",
            output.to_string_lossy().as_ref(),
        ])
        .status()
        .expect("run screengen");
    assert_eq!(status.code(), Some(0));

    let yaml = std::fs::read_to_string(&output).expect("read output");
    assert!(yaml.contains("globals:"));
    assert!(yaml.contains("display:"));
    assert!(yaml.contains("Hello"));
}

#[test]
fn prints_to_stdout_without_output_flag() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("project.json");
    std::fs::write(&input, PROJECT).expect("write project");

    let out = Command::new(bin())
        .arg(input.to_string_lossy().as_ref())
        .output()
        .expect("run screengen");
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("script:"));
    assert!(stdout.ends_with('\n'));
}

#[test]
fn accepts_yaml_projects() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("project.yaml");
    std::fs::write(
        &input,
        "device_model: trmnl\npages:\n  - name: Home\n    widgets: []\n",
    )
    .expect("write project");

    let out = Command::new(bin())
        .arg(input.to_string_lossy().as_ref())
        .output()
        .expect("run screengen");
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("epaper_display"));
}

#[test]
fn exit_code_usage_is_1_for_missing_args() {
    let out = Command::new(bin()).output().expect("run screengen");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Usage"));
}

#[test]
fn exit_code_input_is_2_for_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope.json");
    let status = Command::new(bin())
        .arg(missing.to_string_lossy().as_ref())
        .status()
        .expect("run screengen");
    assert_eq!(status.code(), Some(2));
}

#[test]
fn exit_code_input_is_2_for_invalid_yaml() {
    let dir = tempfile::tempdir().expect("tempdir");
    let bad = dir.path().join("bad.yaml");
    std::fs::write(&bad, "pages: [1, 2,").expect("write bad yaml");
    let status = Command::new(bin())
        .arg(bad.to_string_lossy().as_ref())
        .status()
        .expect("run screengen");
    assert_eq!(status.code(), Some(2));
}

#[test]
fn exit_code_processing_is_3_for_unknown_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("project.json");
    std::fs::write(
        &input,
        r#"{ "device_model": "toaster_9000", "pages": [{ "name": "A", "widgets": [] }] }"#,
    )
    .expect("write project");
    let status = Command::new(bin())
        .arg(input.to_string_lossy().as_ref())
        .status()
        .expect("run screengen");
    assert_eq!(status.code(), Some(3));
}
