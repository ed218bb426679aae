//! CSV output of analysis rows.

use std::io::Write;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use medium_ngrams_core::pipeline::OutputRow;

/// Suffix of every per-category output file.
pub const OUTPUT_SUFFIX: &str = ".ngrams.csv";

/// Output file for a category slug inside `dir`.
pub fn output_path(dir: &Utf8Path, slug: &str) -> Utf8PathBuf {
    dir.join(format!("{slug}{OUTPUT_SUFFIX}"))
}

/// Serialize `rows` as CSV with a header line.
///
/// The header is written even when `rows` is empty.
pub fn write_rows<W: Write>(writer: W, rows: &[OutputRow]) -> anyhow::Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(HEADER)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write `rows` to `path`, creating parent directories.
#[tracing::instrument(skip(rows), fields(rows = rows.len()))]
pub fn write_csv(path: &Utf8Path, rows: &[OutputRow]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {parent}"))?;
    }
    let file = std::fs::File::create(path.as_std_path())
        .with_context(|| format!("failed to create {path}"))?;
    write_rows(std::io::BufWriter::new(file), rows)
        .with_context(|| format!("failed to write {path}"))?;
    tracing::info!(%path, "csv written");
    Ok(())
}

const HEADER: [&str; 9] = [
    "length",
    "category",
    "ngram",
    "frequency",
    "aat_id",
    "aat_name",
    "aat_facet",
    "aat_record_type",
    "match",
];

#[cfg(test)]
mod tests {
    use super::*;
    use medium_ngrams_core::tally::NgramFrequency;
    use medium_ngrams_core::vocabulary::{MatchQuality, VocabularyEntry, VocabularyMatch};

    fn render(rows: &[OutputRow]) -> String {
        let mut buf = Vec::new();
        write_rows(&mut buf, rows).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn header_only_when_empty() {
        assert_eq!(
            render(&[]),
            "length,category,ngram,frequency,aat_id,aat_name,aat_facet,aat_record_type,match\n"
        );
    }

    #[test]
    fn unmatched_columns_are_empty() {
        let row = OutputRow::new("all", 2, &NgramFrequency::new("oil on", 2), None);
        let out = render(&[row]);
        assert_eq!(out.lines().nth(1), Some("2,all,oil on,2,,,,,"));
    }

    #[test]
    fn matched_row_fills_vocabulary_columns() {
        let matched = VocabularyMatch {
            entry: VocabularyEntry {
                id: "300264831".to_string(),
                name: "gold foil".to_string(),
                terms: vec!["gold leaf".to_string()],
                facet: Some("Materials".to_string()),
                record_type: Some("Concept".to_string()),
                ..VocabularyEntry::default()
            },
            quality: MatchQuality::Synonym,
        };
        let row = OutputRow::new(
            "Painting",
            2,
            &NgramFrequency::new("gold leaf", 7),
            Some(&matched),
        );
        let out = render(&[row]);
        assert_eq!(
            out.lines().nth(1),
            Some("2,Painting,gold leaf,7,300264831,gold foil,Materials,Concept,synonym")
        );
    }

    #[test]
    fn write_csv_creates_directories() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap().join("out");
        let path = output_path(&dir, "painting");
        write_csv(&path, &[]).unwrap();
        assert!(path.is_file());
        assert!(path.as_str().ends_with("painting.ngrams.csv"));
    }
}
