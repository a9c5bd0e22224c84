//! End-to-end tests for training, evaluation, prediction and the artifact
//! pairing check

mod util;

use anyhow::Result;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::Value;

use util::{other_labeled_csv, sift, workspace};

fn train(tmp: &assert_fs::TempDir) {
    sift(tmp)
        .args(["--quiet", "train", "labeled.csv"])
        .assert()
        .success();
}

fn json_stdout(cmd: &mut assert_cmd::Command) -> Result<Value> {
    let out = cmd.assert().success().get_output().stdout.clone();
    Ok(serde_json::from_slice(&out)?)
}

fn predictions(path: &std::path::Path) -> Result<Vec<(String, f64, String)>> {
    let mut rdr = csv::Reader::from_path(path)?;
    assert_eq!(
        rdr.headers()?.iter().collect::<Vec<_>>(),
        vec!["id", "headline", "probability", "label"]
    );
    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        rows.push((rec[0].to_string(), rec[2].parse()?, rec[3].to_string()));
    }
    Ok(rows)
}

#[test]
fn train_writes_paired_artifacts_and_report() {
    let tmp = workspace();

    sift(&tmp)
        .args(["--no-color", "train", "labeled.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("train=16 test=4"))
        .stdout(predicate::str::contains("precision"))
        .stdout(predicate::str::contains("accuracy"))
        .stdout(predicate::str::contains("Wrote model to model"));

    tmp.child("model/feature_space.json")
        .assert(predicate::path::is_file());
    tmp.child("model/model.json")
        .assert(predicate::path::is_file());
}

#[test]
fn train_json_summarises_the_run() -> Result<()> {
    let tmp = workspace();

    let v = json_stdout(sift(&tmp).args(["train", "labeled.csv", "--out-dir", "m", "--json"]))?;
    assert_eq!(v["train_size"], 16);
    assert_eq!(v["test_size"], 4);
    assert_eq!(v["converged"], true);
    assert_eq!(v["report"]["support"], 4);
    assert!(v["vocabulary"].as_u64().unwrap_or(0) > 0);

    let fs: Value = serde_json::from_str(&std::fs::read_to_string(tmp.child("m/feature_space.json").path())?)?;
    assert_eq!(fs["identity"], v["feature_space_id"]);
    assert_eq!(fs["n_documents"], 16);

    let model: Value = serde_json::from_str(&std::fs::read_to_string(tmp.child("m/model.json").path())?)?;
    assert_eq!(model["schema_version"], 1);
    assert_eq!(model["model"]["feature_space_id"], v["feature_space_id"]);
    Ok(())
}

#[test]
fn training_is_deterministic_for_a_seed() -> Result<()> {
    let tmp = workspace();

    let a = json_stdout(sift(&tmp).args(["train", "labeled.csv", "--seed", "3", "--out-dir", "a", "--json"]))?;
    let b = json_stdout(sift(&tmp).args(["train", "labeled.csv", "--seed", "3", "--out-dir", "b", "--json"]))?;
    assert_eq!(a["feature_space_id"], b["feature_space_id"]);
    assert_eq!(a["report"], b["report"]);

    let wa: Value = serde_json::from_str(&std::fs::read_to_string(tmp.child("a/model.json").path())?)?;
    let wb: Value = serde_json::from_str(&std::fs::read_to_string(tmp.child("b/model.json").path())?)?;
    assert_eq!(wa["model"], wb["model"]);
    Ok(())
}

#[test]
fn max_features_caps_vocabulary() -> Result<()> {
    let tmp = workspace();

    let v = json_stdout(sift(&tmp).args([
        "--dry-run",
        "train",
        "labeled.csv",
        "--max-features",
        "3",
        "--json",
    ]))?;
    assert_eq!(v["vocabulary"], 3);
    assert_eq!(v["written"], false);
    tmp.child("model")
        .assert(predicate::path::missing());
    Ok(())
}

#[test]
fn single_label_training_fails_without_artifacts() {
    let tmp = workspace();
    tmp.child("one.csv")
        .write_str("text,sentiment\nrassismus bericht,relevant\nhetze bericht,relevant\n")
        .unwrap();

    sift(&tmp)
        .args(["train", "one.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sift::insufficient_classes"));

    tmp.child("model")
        .assert(predicate::path::missing());
}

#[test]
fn out_of_range_max_df_fails_without_artifacts() {
    let tmp = workspace();

    sift(&tmp)
        .env("SIFT__FEATURES__MAX_DF", "1.5")
        .args(["train", "labeled.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sift::parameter"))
        .stderr(predicate::str::contains("max_df"));

    tmp.child("model")
        .assert(predicate::path::missing());
}

#[test]
fn unknown_label_names_the_row() {
    let tmp = workspace();
    tmp.child("bad.csv")
        .write_str("text,sentiment\nrassismus,relevant\nwetter,vielleicht\n")
        .unwrap();

    sift(&tmp)
        .args(["train", "bad.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sift::schema"))
        .stderr(predicate::str::contains("vielleicht"));
}

#[test]
fn evaluate_reports_on_labeled_data() -> Result<()> {
    let tmp = workspace();
    train(&tmp);

    sift(&tmp)
        .args(["--no-color", "evaluate", "labeled.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("20 samples"))
        .stdout(predicate::str::contains("macro avg"));

    let v = json_stdout(sift(&tmp).args(["evaluate", "labeled.csv", "--json"]))?;
    assert_eq!(v["report"]["support"], 20);
    let acc = v["report"]["accuracy"].as_f64().unwrap_or(0.0);
    assert!(acc >= 0.9, "accuracy {acc}");
    Ok(())
}

#[test]
fn predict_scores_every_article() -> Result<()> {
    let tmp = workspace();
    train(&tmp);

    sift(&tmp)
        .args(["predict", "corpus.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scored 6 articles"));

    let rows = predictions(tmp.child("corpus_predictions.csv").path())?;
    assert_eq!(rows.len(), 6);
    for (id, p, label) in &rows {
        assert!((0.0..=1.0).contains(p), "{id}: {p}");
        let expected = if *p >= 0.5 { "relevant" } else { "irrelevant" };
        assert_eq!(label, expected, "{id}");
    }
    let label_of = |id: &str| rows.iter().find(|r| r.0 == id).map(|r| r.2.clone());
    assert_eq!(label_of("1").as_deref(), Some("relevant"));
    assert_eq!(label_of("6").as_deref(), Some("relevant"));
    Ok(())
}

#[test]
fn predict_only_relevant_filters_rows() -> Result<()> {
    let tmp = workspace();
    train(&tmp);

    sift(&tmp)
        .args(["--quiet", "predict", "corpus.csv", "--only-relevant", "--output", "hits.csv"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let rows = predictions(tmp.child("hits.csv").path())?;
    assert!(rows.iter().all(|r| r.2 == "relevant"));
    assert!(rows.iter().any(|r| r.0 == "1"));
    Ok(())
}

#[test]
fn threshold_flag_overrides_the_saved_threshold() -> Result<()> {
    let tmp = workspace();
    train(&tmp);

    sift(&tmp)
        .args(["--quiet", "predict", "corpus.csv", "--threshold", "0.999", "--output", "high.csv"])
        .assert()
        .success();
    let rows = predictions(tmp.child("high.csv").path())?;
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|r| r.2 == "irrelevant"));

    sift(&tmp)
        .args(["predict", "corpus.csv", "--threshold", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sift::parameter"));

    // the threshold saved with the model wins over the config file
    tmp.child("sift.toml")
        .write_str("[classifier]\nthreshold = 0.999\n")?;
    sift(&tmp)
        .args(["--quiet", "predict", "corpus.csv", "--output", "saved.csv"])
        .assert()
        .success();
    let rows = predictions(tmp.child("saved.csv").path())?;
    assert!(rows.iter().any(|r| r.0 == "1" && r.2 == "relevant"));
    Ok(())
}

#[test]
fn inspect_lists_contributing_terms() -> Result<()> {
    let tmp = workspace();
    train(&tmp);

    sift(&tmp)
        .args(["--no-color", "inspect", "Rassismus und Diskriminierung"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("relevant"))
        .stdout(predicate::str::contains("rassismus"))
        .stdout(predicate::str::contains("contribution"));

    let v = json_stdout(sift(&tmp).args(["inspect", "Rassismus und Diskriminierung", "--top", "1", "--json"]))?;
    assert_eq!(v["label"], "relevant");
    assert_eq!(v["terms"].as_array().map(Vec::len), Some(1));

    sift(&tmp)
        .args(["--no-color", "inspect", "qwertz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no known terms"));
    Ok(())
}

#[test]
fn swapped_feature_space_is_rejected() -> Result<()> {
    let tmp = workspace();
    tmp.child("other.csv")
        .write_str(&other_labeled_csv())?;
    train(&tmp);
    sift(&tmp)
        .args(["--quiet", "train", "other.csv", "--out-dir", "other"])
        .assert()
        .success();

    std::fs::copy(
        tmp.child("other/feature_space.json").path(),
        tmp.child("model/feature_space.json").path(),
    )?;

    for args in [
        vec!["predict", "corpus.csv"],
        vec!["evaluate", "labeled.csv"],
        vec!["inspect", "rassismus"],
    ] {
        sift(&tmp)
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("sift::artifact_mismatch"));
    }
    tmp.child("corpus_predictions.csv")
        .assert(predicate::path::missing());
    Ok(())
}

#[test]
fn missing_model_dir_fails() {
    let tmp = workspace();

    sift(&tmp)
        .args(["predict", "corpus.csv", "--model-dir", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nowhere"));
}

#[test]
fn artifacts_dir_comes_from_config() {
    let tmp = workspace();
    tmp.child("sift.toml")
        .write_str("[artifacts]\ndir = \"trained\"\n")
        .unwrap();

    train(&tmp);
    tmp.child("trained/model.json")
        .assert(predicate::path::is_file());

    sift(&tmp)
        .args(["--quiet", "predict", "corpus.csv"])
        .assert()
        .success();
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let tmp = workspace();

    sift(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));
    tmp.child("sift.toml")
        .assert(predicate::str::contains("austria-africa-v1"));

    sift(&tmp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    sift(&tmp)
        .args(["init", "--force"])
        .assert()
        .success();

    // the generated file loads back
    sift(&tmp)
        .args(["--quiet", "filter", "corpus.csv"])
        .assert()
        .success();
}

#[test]
fn completions_print_to_stdout() {
    let tmp = workspace();

    sift(&tmp)
        .args(["completions", "bash", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sift"));
}
