use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use zstd::stream::read::Decoder as ZstdDecoder;

use super::error::{DatasetError, ErrorAccumulator};
use super::filter::OpeningFilter;
use super::moves::split_moves;
use super::types::OpeningRecord;

pub type DatasetInput = Box<dyn Read>;

/// First entry of the ECO selector.
pub const ALL_ECO: &str = "All";

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CompressionMode {
    #[default]
    Plain,
    Zstd,
}

impl CompressionMode {
    pub fn parse(raw: &str) -> Result<Self, DatasetError> {
        let normalized = raw.trim();
        if normalized.eq_ignore_ascii_case("zstd") {
            Ok(Self::Zstd)
        } else {
            Err(DatasetError::Compression(normalized.to_string()))
        }
    }

    /// An explicit mode wins; otherwise `.zst` files are decompressed.
    pub fn for_path(path: &Path, explicit: Option<Self>) -> Self {
        if let Some(mode) = explicit {
            return mode;
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("zst") => Self::Zstd,
            _ => Self::Plain,
        }
    }
}

/// CSV row as stored on disk: `ECO,Name,Moves,Description`.
#[derive(Debug, Deserialize)]
struct OpeningRow {
    #[serde(rename = "ECO")]
    eco: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Moves", default)]
    moves: Option<String>,
    #[serde(rename = "Description", default)]
    description: Option<String>,
}

impl From<OpeningRow> for OpeningRecord {
    fn from(row: OpeningRow) -> Self {
        OpeningRecord {
            eco: row.eco,
            name: row.name,
            moves: row.moves.as_deref().map(split_moves).unwrap_or_default(),
            description: row.description.unwrap_or_default(),
        }
    }
}

/// The openings table, loaded once and never modified.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<OpeningRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<OpeningRecord>) -> Self {
        Self { records }
    }

    /// Load every file matched by `pattern` (a path, or a glob when it
    /// contains `*` or `?`), in path order.
    pub fn load(pattern: &str, compression: Option<CompressionMode>) -> Result<Self, DatasetError> {
        let paths = resolve_paths(pattern)?;
        let mut records = Vec::new();
        let mut skipped = ErrorAccumulator::default();

        for path in &paths {
            let input = open_input_stream(path, CompressionMode::for_path(path, compression))?;
            records.extend(read_records(input, path, &mut skipped)?);
        }

        let skipped_count = skipped.len();
        if let Some(msg) = skipped.take() {
            log::warn!("skipped {skipped_count} malformed dataset rows: {msg}");
        }
        log::info!("loaded {} openings from {} file(s)", records.len(), paths.len());

        Ok(Self { records })
    }

    /// Like [`Dataset::load`], but any failure degrades to an empty dataset.
    pub fn load_or_empty(pattern: &str, compression: Option<CompressionMode>) -> Self {
        match Self::load(pattern, compression) {
            Ok(dataset) => dataset,
            Err(DatasetError::Missing(path)) => {
                log::warn!(
                    "dataset '{}' not found; continuing with no openings",
                    path.display()
                );
                Self::default()
            }
            Err(e) => {
                log::error!("{e}; continuing with no openings");
                Self::default()
            }
        }
    }

    pub fn records(&self) -> &[OpeningRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `All` followed by the sorted, distinct ECO codes of the full table.
    pub fn eco_choices(&self) -> Vec<String> {
        let codes: BTreeSet<&str> = self.records.iter().map(|r| r.eco.as_str()).collect();
        std::iter::once(ALL_ECO.to_string())
            .chain(codes.into_iter().map(str::to_string))
            .collect()
    }

    pub fn filtered(&self, filter: &OpeningFilter) -> Vec<&OpeningRecord> {
        self.records.iter().filter(|r| filter.matches(r)).collect()
    }

    pub fn find(&self, name: &str) -> Option<&OpeningRecord> {
        self.records.iter().find(|r| r.name == name)
    }
}

fn resolve_paths(pattern: &str) -> Result<Vec<PathBuf>, DatasetError> {
    if pattern.contains('*') || pattern.contains('?') {
        let mut paths: Vec<PathBuf> = glob::glob(pattern)?
            .filter_map(|entry| entry.ok())
            .collect();
        paths.sort();
        if paths.is_empty() {
            return Err(DatasetError::Missing(PathBuf::from(pattern)));
        }
        Ok(paths)
    } else {
        Ok(vec![PathBuf::from(pattern)])
    }
}

pub fn open_input_stream(
    path: &Path,
    compression: CompressionMode,
) -> Result<DatasetInput, DatasetError> {
    let file = File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => DatasetError::Missing(path.to_path_buf()),
        _ => DatasetError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    match compression {
        CompressionMode::Plain => Ok(Box::new(file)),
        CompressionMode::Zstd => ZstdDecoder::new(file)
            .map(|decoder| Box::new(decoder) as DatasetInput)
            .map_err(|source| DatasetError::Io {
                path: path.to_path_buf(),
                source,
            }),
    }
}

/// Rows that fail to decode are skipped and recorded in `skipped`; an
/// unreadable header aborts the file.
fn read_records<R: Read>(
    input: R,
    path: &Path,
    skipped: &mut ErrorAccumulator,
) -> Result<Vec<OpeningRecord>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    reader.headers().map_err(|source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for (i, row) in reader.deserialize::<OpeningRow>().enumerate() {
        match row {
            Ok(row) => records.push(row.into()),
            Err(e) => {
                // +2: one for the header, one for 1-based rows.
                skipped.push(&format!("{} row {}: {}", path.display(), i + 2, e));
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    const SAMPLE: &str = "ECO,Name,Moves,Description
C20,King's Pawn Game,e4 e5,Open game
B20,Sicilian Defense,e4 c5,Sharp reply
C51,Evans Gambit,e4 e5 Nf3 Nc6 Bc4 Bc5 b4,Pawn sacrifice
A00,Empty Line,,No moves recorded
";

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("openings-test-{}-{}", std::process::id(), name))
    }

    fn read_sample(text: &str) -> (Vec<OpeningRecord>, ErrorAccumulator) {
        let mut skipped = ErrorAccumulator::default();
        let records = read_records(text.as_bytes(), Path::new("sample.csv"), &mut skipped).unwrap();
        (records, skipped)
    }

    #[test]
    fn test_read_records_basic() {
        let (records, skipped) = read_sample(SAMPLE);
        assert!(skipped.is_empty());
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].eco, "C20");
        assert_eq!(records[0].name, "King's Pawn Game");
        assert_eq!(records[0].moves, ["e4", "e5"]);
        assert_eq!(records[0].description, "Open game");
    }

    #[test]
    fn test_read_records_empty_moves_cell() {
        let (records, _) = read_sample(SAMPLE);
        assert!(records[3].moves.is_empty());
    }

    #[test]
    fn test_read_records_quoted_fields() {
        let text = "ECO,Name,Moves,Description\nC60,\"Ruy Lopez, Morphy\",\"1. e4 e5 2. Nf3\",\"Spanish, main\"\n";
        let (records, _) = read_sample(text);
        assert_eq!(records[0].name, "Ruy Lopez, Morphy");
        assert_eq!(records[0].moves, ["e4", "e5", "Nf3"]);
        assert_eq!(records[0].description, "Spanish, main");
    }

    #[test]
    fn test_read_records_skips_malformed_rows() {
        let text = "ECO,Name,Moves,Description\nC20,King's Pawn Game,e4 e5,ok\nbroken\nB20,Sicilian Defense,e4 c5,ok\n";
        let (records, mut skipped) = read_sample(text);
        assert_eq!(records.len(), 2);
        assert_eq!(skipped.len(), 1);
        assert!(skipped.take().unwrap().contains("row 3"));
    }

    #[test]
    fn test_read_records_header_only() {
        let (records, skipped) = read_sample("ECO,Name,Moves,Description\n");
        assert!(records.is_empty());
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_eco_choices_sorted_distinct() {
        let (records, _) = read_sample(SAMPLE);
        let dataset = Dataset::from_records(records);
        assert_eq!(dataset.eco_choices(), ["All", "A00", "B20", "C20", "C51"]);
    }

    #[test]
    fn test_eco_choices_empty_dataset() {
        assert_eq!(Dataset::default().eco_choices(), ["All"]);
    }

    #[test]
    fn test_find_by_name() {
        let (records, _) = read_sample(SAMPLE);
        let dataset = Dataset::from_records(records);
        assert_eq!(dataset.find("Evans Gambit").unwrap().eco, "C51");
        assert!(dataset.find("evans gambit").is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let path = temp_path("does-not-exist.csv");
        let err = Dataset::load(path.to_str().unwrap(), None).unwrap_err();
        assert!(matches!(err, DatasetError::Missing(p) if p == path));
    }

    #[test]
    fn test_load_or_empty_degrades_on_missing_file() {
        let path = temp_path("also-missing.csv");
        let dataset = Dataset::load_or_empty(path.to_str().unwrap(), None);
        assert!(dataset.is_empty());
        assert_eq!(dataset.eco_choices(), ["All"]);
    }

    #[test]
    fn test_load_glob_with_no_matches_is_missing() {
        let pattern = temp_path("nothing-*.csv");
        let err = Dataset::load(pattern.to_str().unwrap(), None).unwrap_err();
        assert!(matches!(err, DatasetError::Missing(_)));
    }

    #[test]
    fn test_load_plain_and_zstd_files_by_glob() {
        let dir = temp_path("glob-dir");
        fs::create_dir_all(&dir).unwrap();

        fs::write(
            dir.join("a.csv"),
            "ECO,Name,Moves,Description\nC20,King's Pawn Game,e4 e5,a\n",
        )
        .unwrap();

        let compressed = zstd::encode_all(
            "ECO,Name,Moves,Description\nB20,Sicilian Defense,e4 c5,b\n".as_bytes(),
            0,
        )
        .unwrap();
        let mut file = File::create(dir.join("b.csv.zst")).unwrap();
        file.write_all(&compressed).unwrap();
        drop(file);

        let pattern = dir.join("*");
        let dataset = Dataset::load(pattern.to_str().unwrap(), None).unwrap();
        let names: Vec<&str> = dataset.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["King's Pawn Game", "Sicilian Defense"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_parse_compression_mode() {
        assert_eq!(CompressionMode::parse("ZSTD").unwrap(), CompressionMode::Zstd);
        assert!(matches!(
            CompressionMode::parse("gzip"),
            Err(DatasetError::Compression(v)) if v == "gzip"
        ));
    }

    #[test]
    fn test_compression_for_path() {
        assert_eq!(
            CompressionMode::for_path(Path::new("x.csv.zst"), None),
            CompressionMode::Zstd
        );
        assert_eq!(
            CompressionMode::for_path(Path::new("x.csv"), None),
            CompressionMode::Plain
        );
        assert_eq!(
            CompressionMode::for_path(Path::new("x.csv"), Some(CompressionMode::Zstd)),
            CompressionMode::Zstd
        );
    }
}
