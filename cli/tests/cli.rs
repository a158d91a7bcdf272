use std::fs;
use std::path::Path;

use anyhow::Result;
use predicates::str::contains;
use pretty_assertions::assert_eq;
use serde_json::Value as JsonValue;
use serde_json::json;
use tempfile::TempDir;

fn intel_command(data_dir: &Path) -> Result<assert_cmd::Command> {
    let mut cmd = assert_cmd::Command::cargo_bin("intel")?;
    cmd.env_remove("INTEL_CONFIG").arg("--data-dir").arg(data_dir);
    Ok(cmd)
}

fn evidence_dir() -> Result<TempDir> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("evidence.json"),
        r#"{"company_intelligence": {"name": "Acme", "revenue": "$5M"}}"#,
    )?;
    fs::write(dir.path().join("broken.json"), "{ not json")?;
    Ok(dir)
}

fn stdout_json(output: &std::process::Output) -> Result<JsonValue> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn discover_reports_stats_and_exports() -> Result<()> {
    let dir = evidence_dir()?;
    let export = dir.path().join("out").join("registry.json");

    let output = intel_command(dir.path())?
        .arg("discover")
        .arg("--export")
        .arg(&export)
        .output()?;
    assert!(output.status.success());
    let stats = stdout_json(&output)?;
    assert_eq!(stats["files_scanned"], json!(2));
    assert_eq!(stats["errors"], json!(1));
    assert_eq!(stats["types_discovered"], json!(1));

    let exported: JsonValue = serde_json::from_str(&fs::read_to_string(&export)?)?;
    // Four built-in handlers plus the discovered type.
    assert_eq!(exported["total_types"], json!(5));
    assert!(exported["types"].get("company_intelligence").is_some());
    Ok(())
}

#[test]
fn types_filters_implemented_handlers() -> Result<()> {
    let dir = evidence_dir()?;
    let output = intel_command(dir.path())?
        .args(["types", "--implemented"])
        .output()?;
    assert!(output.status.success());
    let names: Vec<String> = stdout_json(&output)?
        .as_array()
        .map(|types| {
            types
                .iter()
                .filter_map(|info| info["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(
        names,
        vec!["career_path", "job_match", "salary_analysis", "skill_gap_analysis"]
    );
    Ok(())
}

#[test]
fn implemented_types_keep_discovered_categories() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("e.json"),
        r#"{"skill_gaps": {"missing": ["go"]}, "career_progression": {"next": "lead"}}"#,
    )?;
    let output = intel_command(dir.path())?
        .args(["types", "--category", "Skills & Capabilities"])
        .output()?;
    assert!(output.status.success());
    let types = stdout_json(&output)?;
    assert_eq!(types[0]["name"], json!("skill_gap_analysis"));
    assert_eq!(types[0]["is_implemented"], json!(true));
    assert_eq!(types[0]["evidence_files"], json!(["e.json"]));

    let output = intel_command(dir.path())?
        .args(["types", "--implemented"])
        .output()?;
    let career = stdout_json(&output)?
        .as_array()
        .and_then(|types| {
            types
                .iter()
                .find(|info| info["name"] == json!("career_path"))
                .cloned()
        })
        .unwrap_or_default();
    assert_eq!(career["category"], json!("Career Development"));
    Ok(())
}

#[test]
fn run_returns_stub_with_portal_metadata() -> Result<()> {
    let dir = evidence_dir()?;
    let output = intel_command(dir.path())?
        .args(["run", "company_intelligence", "--portal", "admin"])
        .output()?;
    assert!(output.status.success());
    let value = stdout_json(&output)?;
    assert_eq!(value["status"], json!("not_implemented"));
    assert_eq!(value["schema"]["revenue"], json!("currency"));
    assert_eq!(value["portal_bridge_metadata"]["portal_type"], json!("admin"));
    Ok(())
}

#[test]
fn run_invokes_builtin_handler_with_options() -> Result<()> {
    let dir = evidence_dir()?;
    let output = intel_command(dir.path())?
        .args([
            "run",
            "career_path",
            "--data",
            r#"{"profile": {"current_role": "Software Engineer", "experience_years": 4}}"#,
            "--option",
            "timeframe_years=3",
        ])
        .output()?;
    assert!(output.status.success());
    let value = stdout_json(&output)?;
    assert_eq!(value["timeframe_years"], json!(3));
    assert_eq!(
        value["predicted_path"],
        json!([{"year": 3, "role": "Senior Software Engineer"}])
    );
    assert_eq!(value["portal_bridge_metadata"]["portal_type"], json!("user"));
    Ok(())
}

#[test]
fn run_rejects_invalid_payload() -> Result<()> {
    let dir = evidence_dir()?;
    intel_command(dir.path())?
        .args(["run", "job_match", "--data", "{oops"])
        .assert()
        .failure()
        .stderr(contains("--data must be a JSON document"));
    Ok(())
}

#[test]
fn status_prints_report_and_honours_config_file() -> Result<()> {
    let dir = evidence_dir()?;
    let config_path = dir.path().join("intel.toml");
    fs::write(
        &config_path,
        format!("data_dir = {:?}\n", dir.path().display().to_string()),
    )?;

    assert_cmd::Command::cargo_bin("intel")?
        .env("INTEL_CONFIG", &config_path)
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Intelligence types: 5"))
        .stdout(contains("company_intelligence"));
    Ok(())
}
