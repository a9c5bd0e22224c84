//! CSV corpus, label and prediction files.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::article::Article;
use crate::core::error::{Result, SiftError};
use crate::core::labels::{Label, LabeledSample};

pub const CORPUS_COLUMNS: [&str; 5] = ["id", "headline", "text", "date", "source"];

/// One scored article as written by `predict`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow
{
    pub id: String,
    pub headline: String,
    pub probability: f64,
    pub label: Label,
}

/// Header positions, matched case-insensitively after trimming.
struct Columns
{
    headers: Vec<String>,
    source_name: String,
}

impl Columns
{
    fn new(
        headers: &StringRecord,
        source_name: &str,
    ) -> Self
    {
        Self {
            headers: headers
                .iter()
                .map(|h| {
                    h.trim_start_matches('\u{feff}')
                        .trim()
                        .to_lowercase()
                })
                .collect(),
            source_name: source_name.to_string(),
        }
    }

    fn find(
        &self,
        name: &str,
    ) -> Option<usize>
    {
        self.headers
            .iter()
            .position(|h| h == name)
    }

    fn require(
        &self,
        name: &str,
    ) -> Result<usize>
    {
        self.find(name).ok_or_else(|| {
            SiftError::schema(&self.source_name, format!("missing required column `{name}`"))
        })
    }
    /// Flag rows with fewer cells than the header; their missing cells read
    /// as empty. Returns true when the row was short.
    fn check_width(
        &self,
        record: &StringRecord,
        row: usize,
    ) -> bool
    {
        let short = record.len() < self.headers.len();
        if short
        {
            warn!(
                source = %self.source_name,
                row,
                line = ?record.position().map(|p| p.line()),
                cells = record.len(),
                expected = self.headers.len(),
                "short row, missing cells read as empty"
            );
        }
        short
    }
}

fn cell(
    record: &StringRecord,
    idx: usize,
) -> String
{
    record
        .get(idx)
        .unwrap_or("")
        .to_string()
}

fn open(path: &Path) -> Result<File>
{
    File::open(path).map_err(|source| SiftError::Io { path: path.to_path_buf(), source })
}

fn create(path: &Path) -> Result<File>
{
    File::create(path).map_err(|source| SiftError::Io { path: path.to_path_buf(), source })
}

fn csv_error(
    path: &Path,
    source: csv::Error,
) -> SiftError
{
    SiftError::Csv { path: path.to_path_buf(), source }
}

fn display_name(path: &Path) -> String
{
    path.display()
        .to_string()
}

/// Load a corpus CSV. Extra columns are ignored; empty cells become empty
/// strings.
pub fn read_corpus(
    path: &Path,
    delimiter: u8,
) -> Result<Vec<Article>>
{
    let articles = read_corpus_from(open(path)?, &display_name(path), delimiter)
        .map_err(|e| with_path(e, path))?;
    info!(path = %path.display(), rows = articles.len(), "corpus loaded");
    Ok(articles)
}

pub fn read_corpus_from<R: Read>(
    reader: R,
    source_name: &str,
    delimiter: u8,
) -> Result<Vec<Article>>
{
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let cols = Columns::new(
        rdr.headers()
            .map_err(|e| csv_error(Path::new(source_name), e))?,
        source_name,
    );
    let [id, headline, text, date, source] = CORPUS_COLUMNS.map(|name| cols.require(name));
    let (id, headline, text, date, source) = (id?, headline?, text?, date?, source?);

    let mut out = Vec::new();
    for (i, record) in rdr
        .records()
        .enumerate()
    {
        let record = record.map_err(|e| csv_error(Path::new(source_name), e))?;
        cols.check_width(&record, i + 1);
        out.push(Article {
            id: cell(&record, id),
            headline: cell(&record, headline),
            text: cell(&record, text),
            raw_date: cell(&record, date),
            date: None,
            source: cell(&record, source),
        });
    }
    Ok(out)
}

/// Write articles with the corpus columns; the date is ISO or empty.
pub fn write_corpus(
    path: &Path,
    articles: &[Article],
    delimiter: u8,
) -> Result<()>
{
    write_corpus_to(create(path)?, articles, delimiter).map_err(|e| with_path(e, path))?;
    debug!(path = %path.display(), rows = articles.len(), "corpus written");
    Ok(())
}

pub fn write_corpus_to<W: Write>(
    writer: W,
    articles: &[Article],
    delimiter: u8,
) -> Result<()>
{
    let err = |e| csv_error(Path::new("<output>"), e);
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    wtr.write_record(CORPUS_COLUMNS)
        .map_err(err)?;
    for a in articles
    {
        wtr.write_record([
            a.id.as_str(),
            a.headline.as_str(),
            a.text.as_str(),
            a.date_column().as_str(),
            a.source.as_str(),
        ])
        .map_err(err)?;
    }
    wtr.flush()
        .map_err(|source| SiftError::Io { path: "<output>".into(), source })
}

/// Load human-labeled samples. `text` and `sentiment` are required; `id`
/// defaults to the 1-based row number.
pub fn read_labeled(
    path: &Path,
    delimiter: u8,
) -> Result<Vec<LabeledSample>>
{
    let samples = read_labeled_from(open(path)?, &display_name(path), delimiter)
        .map_err(|e| with_path(e, path))?;
    info!(path = %path.display(), rows = samples.len(), "labeled samples loaded");
    Ok(samples)
}

pub fn read_labeled_from<R: Read>(
    reader: R,
    source_name: &str,
    delimiter: u8,
) -> Result<Vec<LabeledSample>>
{
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let cols = Columns::new(
        rdr.headers()
            .map_err(|e| csv_error(Path::new(source_name), e))?,
        source_name,
    );
    let text = cols.require("text")?;
    let sentiment = cols.require("sentiment")?;
    let id = cols.find("id");

    let mut out = Vec::new();
    for (i, record) in rdr
        .records()
        .enumerate()
    {
        let row = i + 1;
        let record = record.map_err(|e| csv_error(Path::new(source_name), e))?;
        cols.check_width(&record, row);

        let raw_label = cell(&record, sentiment);
        let label = Label::parse(&raw_label).ok_or_else(|| {
            SiftError::schema(
                source_name,
                format!("row {row}: unknown label `{raw_label}` (expected relevant or irrelevant)"),
            )
        })?;

        let id = id
            .map(|c| cell(&record, c))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| row.to_string());

        out.push(LabeledSample::new(id, &cell(&record, text), label));
    }
    Ok(out)
}

pub fn write_predictions(
    path: &Path,
    rows: &[PredictionRow],
    delimiter: u8,
) -> Result<()>
{
    write_predictions_to(create(path)?, rows, delimiter).map_err(|e| with_path(e, path))?;
    debug!(path = %path.display(), rows = rows.len(), "predictions written");
    Ok(())
}

pub fn write_predictions_to<W: Write>(
    writer: W,
    rows: &[PredictionRow],
    delimiter: u8,
) -> Result<()>
{
    let err = |e| csv_error(Path::new("<output>"), e);
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    for row in rows
    {
        wtr.serialize(row)
            .map_err(err)?;
    }
    if rows.is_empty()
    {
        wtr.write_record(["id", "headline", "probability", "label"])
            .map_err(err)?;
    }
    wtr.flush()
        .map_err(|source| SiftError::Io { path: "<output>".into(), source })
}

/// Replace placeholder locations in writer errors with the real path.
fn with_path(
    err: SiftError,
    path: &Path,
) -> SiftError
{
    match err
    {
        SiftError::Csv { source, .. } => SiftError::Csv { path: path.to_path_buf(), source },
        SiftError::Io { source, .. } => SiftError::Io { path: path.to_path_buf(), source },
        other => other,
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    const CORPUS: &str = "\
id,headline,text,date,source,extra
1,Rassismus in Wien,\"Ein Bericht,
über zwei Zeilen\",05.01.2024,Krone,x
2,Leer,,,Heute,y
";

    #[test]
    fn short_rows_read_as_empty_cells()
    {
        let data = "id,headline,text,date,source\n1,Kurz,Nur Text\n2,Voll,Text,2024-01-01,Krone\n";
        let mut rdr = ReaderBuilder::new()
            .flexible(true)
            .from_reader(data.as_bytes());
        let cols = Columns::new(rdr.headers().unwrap(), "short.csv");
        let widths: Vec<bool> = rdr
            .records()
            .enumerate()
            .map(|(i, r)| cols.check_width(&r.unwrap(), i + 1))
            .collect();
        assert_eq!(widths, vec![true, false]);

        let rows = read_corpus_from(data.as_bytes(), "short.csv", b',').unwrap();
        assert_eq!(rows[0].text, "Nur Text");
        assert_eq!(rows[0].raw_date, "");
        assert_eq!(rows[0].source, "");
    }

    #[test]
    fn reads_corpus_and_ignores_extra_columns()
    {
        let rows = read_corpus_from(CORPUS.as_bytes(), "corpus.csv", b',').unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "Ein Bericht,\nüber zwei Zeilen");
        assert_eq!(rows[0].raw_date, "05.01.2024");
        assert_eq!(rows[1].text, "");
        assert_eq!(rows[1].source, "Heute");
    }

    #[test]
    fn missing_column_names_it()
    {
        let err = read_corpus_from("id,headline,text,source\n1,a,b,c\n".as_bytes(), "c.csv", b',')
            .unwrap_err();
        assert!(matches!(err, SiftError::Schema { .. }));
        assert!(err.to_string().contains("`date`"));
    }

    #[test]
    fn headers_match_case_insensitively_with_bom()
    {
        let data = "\u{feff}ID,Headline,TEXT,Date,Source\n7,h,t,,s\n";
        let rows = read_corpus_from(data.as_bytes(), "bom.csv", b',').unwrap();
        assert_eq!(rows[0].id, "7");
    }

    #[test]
    fn semicolon_delimiter()
    {
        let data = "id;headline;text;date;source\n1;a;b,c;;s\n";
        let rows = read_corpus_from(data.as_bytes(), "semi.csv", b';').unwrap();
        assert_eq!(rows[0].text, "b,c");
    }

    #[test]
    fn corpus_write_uses_parsed_date()
    {
        let mut a = Article::new("1", "h", "t").with_date("05.01.2024");
        a.date = chrono::NaiveDate::from_ymd_opt(2024, 1, 5);
        let b = Article::new("2", "h2", "t2").with_date("irgendwann");

        let mut buf = Vec::new();
        write_corpus_to(&mut buf, &[a, b], b',').unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "id,headline,text,date,source\n1,h,t,2024-01-05,\n2,h2,t2,,\n");
    }

    #[test]
    fn labeled_rows_default_ids_and_parse_labels()
    {
        let data = "text,sentiment\nRassismus!, Relevant \nWetter,irrelevant\n";
        let rows = read_labeled_from(data.as_bytes(), "l.csv", b',').unwrap();
        assert_eq!(rows[0].id, "1");
        assert_eq!(rows[0].text, "rassismus");
        assert_eq!(rows[0].label, Label::Relevant);
        assert_eq!(rows[1].id, "2");
    }

    #[test]
    fn unknown_label_reports_row_and_value()
    {
        let data = "id,text,sentiment\na,x,relevant\nb,y,maybe\n";
        let err = read_labeled_from(data.as_bytes(), "l.csv", b',').unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("row 2"), "{msg}");
        assert!(msg.contains("maybe"), "{msg}");
    }

    #[test]
    fn missing_sentiment_column()
    {
        let err = read_labeled_from("text\nx\n".as_bytes(), "l.csv", b',').unwrap_err();
        assert!(err.to_string().contains("`sentiment`"));
    }

    #[test]
    fn predictions_have_a_header()
    {
        let rows = vec![PredictionRow {
            id: "1".into(),
            headline: "h".into(),
            probability: 0.75,
            label: Label::Relevant,
        }];
        let mut buf = Vec::new();
        write_predictions_to(&mut buf, &rows, b',').unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "id,headline,probability,label\n1,h,0.75,relevant\n");

        let mut empty = Vec::new();
        write_predictions_to(&mut empty, &[], b',').unwrap();
        assert_eq!(String::from_utf8(empty).unwrap(), "id,headline,probability,label\n");
    }
}
