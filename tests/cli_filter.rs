//! End-to-end tests for `sift filter` and `sift check`

mod util;

use anyhow::Result;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::Value;

use util::{sift, workspace};

fn json_stdout(cmd: &mut assert_cmd::Command) -> Result<Value> {
    let out = cmd.assert().success().get_output().stdout.clone();
    Ok(serde_json::from_slice(&out)?)
}

fn survivors(report: &Value) -> Vec<u64> {
    report["stages"]
        .as_array()
        .map(|stages| stages.iter().filter_map(|s| s["survivors"].as_u64()).collect())
        .unwrap_or_default()
}

fn ids(csv_text: &str) -> Vec<String> {
    csv_text
        .lines()
        .skip(1)
        .filter_map(|l| l.split(',').next())
        .map(str::to_string)
        .collect()
}

#[test]
fn filter_reports_every_stage_and_writes_survivors() -> Result<()> {
    let tmp = workspace();

    let v = json_stdout(sift(&tmp).args(["filter", "corpus.csv", "--json"]))?;
    let report = &v["report"];

    assert_eq!(report["mode"], "permissive");
    assert_eq!(report["keyword_version"], "austria-africa-v1");
    assert_eq!(report["stages"][0]["input"], 6);
    assert_eq!(survivors(report), vec![5, 4, 3, 2, 2]);
    assert_eq!(report["tally"]["dates_unparsed"], 1);
    assert_eq!(v["written"], true);

    let mut rdr = csv::Reader::from_path(tmp.child("corpus_filtered.csv").path())?;
    assert_eq!(
        rdr.headers()?.iter().collect::<Vec<_>>(),
        vec!["id", "headline", "text", "date", "source"]
    );
    let rows: Vec<csv::StringRecord> = rdr.records().collect::<Result<_, _>>()?;
    let kept: Vec<(&str, &str)> = rows.iter().map(|r| (&r[0], &r[3])).collect();
    assert_eq!(kept, vec![("1", "2024-01-05"), ("6", "")]);
    Ok(())
}

#[test]
fn strict_mode_drops_exclusions_in_keyword_stage() -> Result<()> {
    let tmp = workspace();

    let v = json_stdout(sift(&tmp).args([
        "filter",
        "corpus.csv",
        "--mode",
        "strict",
        "--output",
        "strict.csv",
        "--json",
    ]))?;

    assert_eq!(v["report"]["mode"], "strict");
    assert_eq!(survivors(&v["report"]), vec![5, 2, 2, 2, 2]);

    let out = std::fs::read_to_string(tmp.child("strict.csv").path())?;
    assert_eq!(ids(&out), vec!["1", "6"]);
    Ok(())
}

#[test]
fn filter_text_report_names_stages() {
    let tmp = workspace();

    sift(&tmp)
        .args(["--no-color", "filter", "corpus.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mode=permissive"))
        .stdout(predicate::str::contains("dedupe"))
        .stdout(predicate::str::contains("date_normalization"))
        .stdout(predicate::str::contains("unparsed dates: 1"))
        .stdout(predicate::str::contains("Wrote 2 of 6 articles"));
}

#[test]
fn dry_run_writes_nothing() {
    let tmp = workspace();

    sift(&tmp)
        .args(["--dry-run", "filter", "corpus.csv", "--sample", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would write"));

    tmp.child("corpus_filtered.csv")
        .assert(predicate::path::missing());
    tmp.child("corpus_sample.csv")
        .assert(predicate::path::missing());
}

#[test]
fn review_sample_is_drawn_from_survivors() -> Result<()> {
    let tmp = workspace();

    let v = json_stdout(sift(&tmp).args([
        "filter",
        "corpus.csv",
        "--sample",
        "1",
        "--seed",
        "7",
        "--json",
    ]))?;
    assert_eq!(v["sample"]["rows"], 1);

    let sample = std::fs::read_to_string(tmp.child("corpus_sample.csv").path())?;
    let picked = ids(&sample);
    assert_eq!(picked.len(), 1);
    assert!(picked[0] == "1" || picked[0] == "6");

    // oversized requests return every survivor
    let v = json_stdout(sift(&tmp).args(["filter", "corpus.csv", "--sample", "50", "--json"]))?;
    assert_eq!(v["sample"]["rows"], 2);
    Ok(())
}

#[test]
fn sample_output_requires_sample() {
    let tmp = workspace();

    sift(&tmp)
        .args(["filter", "corpus.csv", "--sample-output", "s.csv"])
        .assert()
        .failure();
}

#[test]
fn config_file_in_working_directory_sets_mode() -> Result<()> {
    let tmp = workspace();
    tmp.child("sift.toml")
        .write_str("[pipeline]\nmode = \"strict\"\n")?;

    let v = json_stdout(sift(&tmp).args(["filter", "corpus.csv", "--json"]))?;
    assert_eq!(v["report"]["mode"], "strict");

    // the flag still wins over the file
    let v = json_stdout(sift(&tmp).args(["filter", "corpus.csv", "--mode", "permissive", "--json"]))?;
    assert_eq!(v["report"]["mode"], "permissive");
    Ok(())
}

#[test]
fn environment_overrides_config() -> Result<()> {
    let tmp = workspace();

    let v = json_stdout(
        sift(&tmp)
            .env("SIFT__PIPELINE__MODE", "strict")
            .args(["filter", "corpus.csv", "--json"]),
    )?;
    assert_eq!(v["report"]["mode"], "strict");
    Ok(())
}

#[test]
fn missing_column_is_a_schema_error() {
    let tmp = workspace();
    tmp.child("broken.csv")
        .write_str("id,headline,date,source\n1,Rassismus,2024-01-01,Krone\n")
        .unwrap();

    sift(&tmp)
        .args(["filter", "broken.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sift::schema"))
        .stderr(predicate::str::contains("text"));

    tmp.child("broken_filtered.csv")
        .assert(predicate::path::missing());
}

#[test]
fn short_rows_are_reported() {
    let tmp = workspace();
    tmp.child("short.csv")
        .write_str("id,headline,text,date,source\n1,Rassismus in Wien,Ein Afrikaner berichtet\n")
        .unwrap();

    sift(&tmp)
        .args(["--no-color", "filter", "short.csv"])
        .assert()
        .success()
        .stderr(predicate::str::contains("short row, missing cells read as empty"));
}

#[test]
fn missing_input_fails() {
    let tmp = workspace();

    sift(&tmp)
        .args(["filter", "nope.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.csv"));
}

#[test]
fn check_explains_each_article() -> Result<()> {
    let tmp = workspace();

    let v = json_stdout(sift(&tmp).args(["check", "corpus.csv", "--json"]))?;
    let rows = v.as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 6);

    let by_id = |id: &str| rows.iter().find(|r| r["id"] == id).cloned().unwrap_or(Value::Null);

    // check does not dedupe, so the copy of 1 is judged on its own
    assert_eq!(by_id("2")["included"], true);
    assert_eq!(by_id("3")["excluded"], true);
    assert_eq!(by_id("4")["noise"], true);
    assert_eq!(by_id("5")["keyword_match"], false);
    assert_eq!(by_id("6")["included"], true);
    Ok(())
}

#[test]
fn strict_check_shows_match_and_veto_separately() -> Result<()> {
    let tmp = workspace();

    let v = json_stdout(sift(&tmp).args(["check", "corpus.csv", "--mode", "strict", "--json"]))?;
    let rows = v.as_array().cloned().unwrap_or_default();
    let three = rows.iter().find(|r| r["id"] == "3").cloned().unwrap_or(Value::Null);

    assert_eq!(three["keyword_match"], true);
    assert_eq!(three["excluded"], true);
    assert_eq!(three["included"], false);
    Ok(())
}

#[test]
fn check_included_only_and_table() -> Result<()> {
    let tmp = workspace();

    let v = json_stdout(sift(&tmp).args(["check", "corpus.csv", "--included-only", "--json"]))?;
    let kept: Vec<&str> = v
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["id"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(kept, vec!["1", "2", "6"]);

    sift(&tmp)
        .args(["--no-color", "check", "corpus.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keyword"))
        .stdout(predicate::str::contains("3 of 6 articles would be kept (mode=permissive)"));
    Ok(())
}
