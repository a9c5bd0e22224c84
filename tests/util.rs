//! Shared test utilities for integration tests
//!
//! Corpus and label fixtures used across the CLI test files.

#![allow(dead_code)]

use assert_cmd::Command;
use assert_fs::prelude::*;

/// Six articles exercising every filter stage under the default keywords:
///
/// - `1` kept
/// - `2` duplicate of `1` (dedupe)
/// - `3` Schwarzenegger (exclusion)
/// - `4` event listing with a time and "Eintritt" (noise)
/// - `5` off topic (keyword)
/// - `6` kept, with an unparseable date
pub const CORPUS: &str = "\
id,headline,text,date,source
1,Rassismus-Vorwurf in Wien,Ein Afrikaner berichtet von Diskriminierung bei der Wohnungssuche.,05.01.2024,Krone
2,Rassismus-Vorwurf in Wien,Ein Afrikaner berichtet von Diskriminierung bei der Wohnungssuche.,05.01.2024,Heute
3,Schwarzenegger dreht in Wien,Arnold Schwarzenegger spricht über Rassismus in Hollywood.,2024-02-01,Oe24
4,Lesung über Rassismus,\"Lesung in der Stadtbibliothek um 18:00 Uhr, Eintritt frei.\",2024-02-02,Krone
5,Wetter,Sonne und Wolken am Wochenende.,2024-02-03,Heute
6,Kenia: Wahl,Nach der Wahl in Kenia gibt es Proteste gegen Rassismus.,irgendwann,Krone
";

const RELEVANT: [&str; 8] = [
    "rassismus",
    "diskriminierung",
    "hetze",
    "vorurteile",
    "migranten",
    "afrikaner",
    "benachteiligung",
    "fremdenfeindlichkeit",
];

const IRRELEVANT: [&str; 8] = ["fussball", "wetter", "konzert", "boerse", "rezept", "stau", "handy", "schnee"];

/// Ten relevant and ten irrelevant rows; every row also contains the shared
/// word "bericht".
pub fn labeled_csv() -> String
{
    let mut out = String::from("id,text,sentiment\n");
    for i in 0..10
    {
        out.push_str(&format!(
            "r{i},{} {} bericht,relevant\n",
            RELEVANT[i % 8],
            RELEVANT[(i + 3) % 8]
        ));
    }
    for i in 0..10
    {
        out.push_str(&format!(
            "i{i},{} {} bericht,irrelevant\n",
            IRRELEVANT[i % 8],
            IRRELEVANT[(i + 3) % 8]
        ));
    }
    out
}

/// Same shape as [`labeled_csv`] over a disjoint vocabulary, so a model
/// trained on it has a different feature space.
pub fn other_labeled_csv() -> String
{
    let mut out = String::from("text,sentiment\n");
    for i in 0..6
    {
        out.push_str(&format!("ausland politik thema{i},relevant\n"));
        out.push_str(&format!("kultur sport thema{i},irrelevant\n"));
    }
    out
}

/// Temp dir holding `corpus.csv` and `labeled.csv`
pub fn workspace() -> assert_fs::TempDir
{
    let tmp = assert_fs::TempDir::new().expect("tempdir");
    tmp.child("corpus.csv")
        .write_str(CORPUS)
        .expect("write corpus");
    tmp.child("labeled.csv")
        .write_str(&labeled_csv())
        .expect("write labels");
    tmp
}

/// `sift` running inside `dir`, logs quiet unless a test asks otherwise
pub fn sift(dir: &assert_fs::TempDir) -> Command
{
    let mut cmd = Command::cargo_bin("sift").expect("sift binary");
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env_remove("SIFT_LOG_FORMAT");
    cmd
}
