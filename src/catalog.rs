use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::CatalogEntry;
use crate::error::ScoreError;

/// Reads the full catalog before any processing starts. The file is
/// headerless CSV, one `level,composer,title` record per piece.
pub fn load(path: &Path) -> Result<Vec<CatalogEntry>, ScoreError> {
    let content =
        fs::read_to_string(path).map_err(|_| ScoreError::CatalogRead(path.to_path_buf()))?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<Vec<CatalogEntry>, ScoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| ScoreError::CatalogParse(err.to_string()))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() < 3 {
            return Err(ScoreError::CatalogParse(format!(
                "expected level,composer,title, got {} fields in {:?}",
                record.len(),
                record
            )));
        }
        entries.push(CatalogEntry::new(&record[0], &record[1], &record[2])?);
    }
    Ok(entries)
}

/// Rewrites the catalog in place: complete entries first, then incomplete,
/// each partition in its original relative order. Written via a sibling temp
/// file so an interrupted rewrite never truncates the catalog.
pub fn rewrite(
    path: &Path,
    complete: &[CatalogEntry],
    incomplete: &[CatalogEntry],
) -> Result<(), ScoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for entry in complete.iter().chain(incomplete) {
        writer
            .write_record([&entry.level, &entry.composer, &entry.title])
            .map_err(|err| ScoreError::CatalogWrite(path.to_path_buf(), err.to_string()))?;
    }
    let content = writer
        .into_inner()
        .map_err(|err| ScoreError::CatalogWrite(path.to_path_buf(), err.to_string()))?;

    let tmp_path = sibling_tmp_path(path);
    fs::write(&tmp_path, &content)
        .map_err(|err| ScoreError::CatalogWrite(path.to_path_buf(), err.to_string()))?;
    fs::rename(&tmp_path, path)
        .map_err(|err| ScoreError::CatalogWrite(path.to_path_buf(), err.to_string()))?;
    Ok(())
}

fn sibling_tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog".to_string());
    name.push_str(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_headerless_records() {
        let entries = parse("3,J.S. Bach,Minuet in G\n5,Debussy,\"Clair de lune, L. 32\"\n").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, "3");
        assert_eq!(entries[1].title, "Clair de lune, L. 32");
    }

    #[test]
    fn skips_blank_lines_and_rejects_short_records() {
        let entries = parse("3,J.S. Bach,Minuet in G\n\n").unwrap();
        assert_eq!(entries.len(), 1);

        let err = parse("3,orphaned\n").unwrap_err();
        assert_matches!(err, ScoreError::CatalogParse(_));
    }

    #[test]
    fn rewrite_partitions_complete_before_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repertoire.csv");

        let a = CatalogEntry::new("1", "Bach", "A").unwrap();
        let b = CatalogEntry::new("2", "Satie", "B").unwrap();
        let c = CatalogEntry::new("3", "Chopin", "C").unwrap();
        rewrite(&path, &[b.clone()], &[a.clone(), c.clone()]).unwrap();

        let reread = load(&path).unwrap();
        assert_eq!(reread, vec![b, a, c]);
    }

    #[test]
    fn quoted_fields_survive_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repertoire.csv");

        let entry = CatalogEntry::new("4", "Liszt", "Liebestraum No. 3, S. 541").unwrap();
        rewrite(&path, &[entry.clone()], &[]).unwrap();
        assert_eq!(load(&path).unwrap(), vec![entry]);
    }

    #[test]
    fn missing_catalog_is_a_read_error() {
        let err = load(Path::new("/nonexistent/repertoire.csv")).unwrap_err();
        assert_matches!(err, ScoreError::CatalogRead(_));
    }
}
