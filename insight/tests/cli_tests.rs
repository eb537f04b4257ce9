use anyhow::{Context, Result};
use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const RANGE: [&str; 4] = ["--start-date", "2024-03-04", "--end-date", "2024-03-31"];

/// Copy of the `demos/partnerlab` project in a temp dir, so tests can edit it.
struct InsightTestEnv {
    _tmp: TempDir,
    root: PathBuf,
}

impl InsightTestEnv {
    fn new() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let project_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .context("Workspace root not found")?
            .join("demos/partnerlab");

        let dest = tmp.path().join("partnerlab");
        Self::copy_dir(&project_root, &dest)?;

        Ok(Self {
            _tmp: tmp,
            root: dest,
        })
    }

    /// Empty directory: no insight.yaml at all.
    fn empty() -> Result<Self> {
        let tmp = tempfile::tempdir()?;
        let root = tmp.path().to_path_buf();
        Ok(Self { _tmp: tmp, root })
    }

    fn copy_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
        let mut options = fs_extra::dir::CopyOptions::new();
        options.skip_exist = true;
        options.content_only = true;

        std::fs::create_dir_all(dst)?;
        fs_extra::dir::copy(src, dst, &options)
            .map(|_| ())
            .map_err(|e| std::io::Error::other(e.to_string()))
    }

    fn insight(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("insight"));
        cmd.current_dir(&self.root);
        cmd.env_remove("INSIGHT_PROJECT_DIR");
        cmd.env_remove("INSIGHT_DATA_DIR");
        cmd.env_remove("INSIGHT_DEMO_SEED");
        cmd.env_remove("INSIGHT_CACHE_CAPACITY");
        cmd
    }

    fn fetch_json(&self, args: &[&str]) -> Result<Value> {
        let output = self.insight().arg("fetch").args(args).output()?;
        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[test]
fn test_fetch_overview_from_files() -> Result<()> {
    let env = InsightTestEnv::new()?;
    let mut args = vec!["overview", "--metrics", "sessions,users,bounceRate"];
    args.extend(RANGE);

    let json = env.fetch_json(&args)?;

    assert_eq!(json["cached"], false);
    assert!(json.get("demo").is_none());
    let metrics = json["data"]["metrics"].as_array().context("metrics array")?;
    assert_eq!(metrics.len(), 3);
    assert_eq!(metrics[0]["metric"], "sessions");
    assert_eq!(metrics[0]["stats"]["sampleCount"], 28);
    assert_eq!(metrics[0]["points"][0]["date"], "2024-03-04");
    // bounceRate comes from a YAML file and is averaged, not summed
    assert!(metrics[2]["total"].as_f64().is_some_and(|t| t > 30.0 && t < 50.0));
    assert_eq!(json["data"]["unavailable"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[test]
fn test_fetch_overview_isolates_missing_metric() -> Result<()> {
    let env = InsightTestEnv::new()?;
    let mut args = vec!["overview", "--metrics", "sessions,conversions"];
    args.extend(RANGE);

    let json = env.fetch_json(&args)?;

    assert_eq!(json["cached"], false);
    assert_eq!(json["data"]["unavailable"][0], "conversions");
    assert_eq!(json["data"]["metrics"][1]["total"], 0.0);
    Ok(())
}

#[test]
fn test_fetch_anomalies_flags_outage() -> Result<()> {
    let env = InsightTestEnv::new()?;
    let mut args = vec!["anomalies", "--metrics", "sessions,users"];
    args.extend(RANGE);

    let json = env.fetch_json(&args)?;

    let anomalies = json["data"]["anomalies"].as_array().context("anomalies array")?;
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0]["metric"], "sessions");
    assert_eq!(anomalies[0]["severity"], "critical");
    assert_eq!(anomalies[0]["direction"], "decrease");
    assert_eq!(anomalies[0]["currentValue"], 400.0);
    assert_eq!(json["data"]["summary"]["critical"], 1);
    Ok(())
}

#[test]
fn test_fetch_trends_weekly_buckets() -> Result<()> {
    let env = InsightTestEnv::new()?;
    let mut args = vec!["trends", "--metrics", "pageViews"];
    args.extend(RANGE);

    let json = env.fetch_json(&args)?;

    let buckets = json["data"]["metrics"][0]["buckets"].as_array().context("buckets")?;
    assert_eq!(buckets.len(), 4);
    assert_eq!(buckets[0]["weekStart"], "2024-03-04");
    assert!(buckets[0]["changePercent"].is_null());
    assert!(buckets[1]["changePercent"].is_number());
    Ok(())
}

#[test]
fn test_missing_project_serves_demo_with_success_exit() -> Result<()> {
    let env = InsightTestEnv::empty()?;

    let json = env.fetch_json(&["overview", "--metrics", "sessions"])?;

    assert_eq!(json["demo"], true);
    assert_eq!(json["error"], "Analytics source not configured");
    assert!(json.get("cached").is_none());
    assert_eq!(json["data"]["metrics"][0]["metric"], "sessions");
    assert!(json["data"]["metrics"][0]["points"].as_array().is_some_and(|p| !p.is_empty()));
    Ok(())
}

#[test]
fn test_credential_gate_skips_fetch() -> Result<()> {
    let env = InsightTestEnv::new()?;
    let config = std::fs::read_to_string(env.root.join("insight.yaml"))?;
    std::fs::write(
        env.root.join("insight.yaml"),
        config.replace(
            "  timeout-secs: 10",
            "  timeout-secs: 10\n  required-env: [INSIGHT_TEST_GA4_PROPERTY_ID]",
        ),
    )?;

    let output = env
        .insight()
        .env_remove("INSIGHT_TEST_GA4_PROPERTY_ID")
        .args(["fetch", "anomalies", "--metrics", "sessions"])
        .output()?;
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["demo"], true);
    assert!(json["message"].as_str().is_some_and(|m| m.contains("not configured")));

    // Same shape as a real anomalies payload
    let mut keys: Vec<&String> = json["data"].as_object().context("data object")?.keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["anomalies", "checked", "range", "summary"]);
    Ok(())
}

#[test]
fn test_demo_is_reproducible_with_seed() -> Result<()> {
    let env = InsightTestEnv::empty()?;
    let run = || -> Result<Vec<u8>> {
        let output = env
            .insight()
            .args(["demo", "trends", "--seed", "7", "--metrics", "sessions"])
            .args(RANGE)
            .output()?;
        assert!(output.status.success());
        Ok(output.stdout)
    };

    let first = run()?;
    assert_eq!(first, run()?);

    let json: Value = serde_json::from_slice(&first)?;
    assert_eq!(json["demo"], true);
    assert_eq!(json["data"]["metrics"][0]["buckets"].as_array().map(Vec::len), Some(4));
    Ok(())
}

#[test]
fn test_replay_shares_one_cache() -> Result<()> {
    let env = InsightTestEnv::new()?;

    let output = env.insight().args(["replay", "--file", "requests.txt"]).output()?;
    assert!(output.status.success());

    let lines: Vec<Value> = String::from_utf8(output.stdout)?
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    // The unknown endpoint line is skipped
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["cached"], false);
    assert_eq!(lines[1]["cached"], true);
    assert_eq!(lines[0]["data"], lines[1]["data"]);

    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("\"cached\":1"));
    assert!(stderr.contains("\"fresh\":3"));
    Ok(())
}

#[test]
fn test_fetch_writes_output_file() -> Result<()> {
    let env = InsightTestEnv::new()?;
    env.insight()
        .args(["fetch", "overview", "--metrics", "sessions", "--output", "out/overview.json"])
        .args(RANGE)
        .assert()
        .success();

    let written: Value = serde_json::from_str(&std::fs::read_to_string(env.root.join("out/overview.json"))?)?;
    assert_eq!(written["cached"], false);
    Ok(())
}

#[test]
fn test_report_table() -> Result<()> {
    let env = InsightTestEnv::new()?;
    env.insight()
        .args(["report", "--metrics", "sessions,users"])
        .args(RANGE)
        .assert()
        .success()
        .stdout(predicate::str::contains("sessions"))
        .stdout(predicate::str::contains("critical"))
        .stdout(predicate::str::contains("1 critical, 0 warning"));
    Ok(())
}

#[test]
fn test_thresholds_include_satellite_overrides() -> Result<()> {
    let env = InsightTestEnv::new()?;
    env.insight()
        .arg("thresholds")
        .assert()
        .success()
        .stdout(predicate::str::contains("partnerlab"))
        .stdout(predicate::str::contains("3.5"))
        .stdout(predicate::str::contains("refunds"))
        .stdout(predicate::str::contains("LowerIsBetter"));
    Ok(())
}

#[test]
fn test_unknown_endpoint_is_a_usage_error() -> Result<()> {
    let env = InsightTestEnv::new()?;
    env.insight()
        .args(["fetch", "cohorts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown endpoint"));
    Ok(())
}

#[test]
fn test_invalid_thresholds_fail_fast() -> Result<()> {
    let env = InsightTestEnv::new()?;
    std::fs::write(
        env.root.join("config/thresholds.yml"),
        "thresholds:\n  sessions:\n    warningMultiplier: 4\n    criticalMultiplier: 2\n",
    )?;
    env.insight().arg("thresholds").assert().failure();
    Ok(())
}
