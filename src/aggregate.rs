//! Streaming aggregation of daily transaction snapshots into per-stop
//! ridership series.

use chrono::NaiveDate;
use flate2::read::GzDecoder;
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

use crate::encoding::decode_field;
use crate::schema::SnapshotColumns;

/// Static attributes of a stop, filled in piecemeal: name and area come
/// from the transaction rows (last writer wins), coordinates from the
/// location reference tables.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StopInfo {
    pub name: Option<String>,
    pub area: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl StopInfo {
    /// First attribute still missing for report eligibility, if any.
    pub fn missing_attribute(&self) -> Option<&'static str> {
        if self.name.is_none() {
            return Some("name");
        }
        if self.area.is_none() {
            return Some("area");
        }
        if self.longitude.is_none() {
            return Some("longitude");
        }
        if self.latitude.is_none() {
            return Some("latitude");
        }
        None
    }
}

/// One stop's accumulated state: attributes plus a per-date transaction
/// count. Date entries keep insertion order; a missing date means zero.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StopRecord {
    pub info: StopInfo,
    pub dates: IndexMap<NaiveDate, u64>,
}

impl StopRecord {
    /// Adds `count` boardings for `date`, summing with any prior
    /// contribution for the same date.
    pub fn add_transactions(&mut self, date: NaiveDate, count: u64) {
        *self.dates.entry(date).or_insert(0) += count;
    }
}

/// All aggregated stops, keyed by stop identifier, in first-seen order.
///
/// Reads through [`record_mut`](Self::record_mut) create an empty record on
/// a missing key; both aggregation and enrichment rely on that.
#[derive(Debug, Default)]
pub struct AggregateStore {
    stops: IndexMap<String, StopRecord>,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create accessor; the only way records come into existence.
    pub fn record_mut(&mut self, stop_id: &str) -> &mut StopRecord {
        self.stops.entry(stop_id.to_string()).or_default()
    }

    pub fn get(&self, stop_id: &str) -> Option<&StopRecord> {
        self.stops.get(stop_id)
    }

    pub fn contains(&self, stop_id: &str) -> bool {
        self.stops.contains_key(stop_id)
    }

    /// Stops in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StopRecord)> {
        self.stops.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

/// Folds every snapshot file, in order, into one [`AggregateStore`].
///
/// Rows whose date or transaction count does not parse, and rows shorter
/// than the schema needs, are skipped with a warning; a single bad upstream
/// row never aborts a multi-day run.
pub fn aggregate_snapshots(
    paths: &[impl AsRef<Path>],
    columns: &SnapshotColumns,
) -> std::io::Result<AggregateStore> {
    let mut store = AggregateStore::new();
    for path in paths {
        let path = path.as_ref();
        info!(file = %path.display(), "reading snapshot");
        read_snapshot(&mut store, path, columns)?;
    }
    Ok(store)
}

fn read_snapshot(
    store: &mut AggregateStore,
    path: &Path,
    columns: &SnapshotColumns,
) -> std::io::Result<()> {
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let file = File::open(path)?;
    let mut reader = BufReader::new(GzDecoder::new(file));

    // Rows are Latin-1-ish, so lines are read as raw bytes and decoded per
    // field. The first line is the header.
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line)?;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        ingest_row(store, &line, columns, &source);
    }
    Ok(())
}

fn ingest_row(store: &mut AggregateStore, line: &[u8], columns: &SnapshotColumns, source: &str) {
    if line.iter().all(|b| b.is_ascii_whitespace()) {
        return;
    }

    let fields: Vec<String> = line.split(|&b| b == b';').map(decode_field).collect();
    if fields.len() < columns.min_fields() {
        warn!(
            source,
            fields = fields.len(),
            "row has too few columns, skipping"
        );
        return;
    }

    let stop_code = &fields[columns.stop_code];

    let date = match fields[columns.date].parse::<NaiveDate>() {
        Ok(date) => date,
        Err(_) => {
            warn!(source, stop = %stop_code, value = %fields[columns.date],
                "unparseable date, skipping row");
            return;
        }
    };

    let count = match fields[columns.transactions].parse::<u64>() {
        Ok(count) => count,
        Err(_) => {
            warn!(source, stop = %stop_code, value = %fields[columns.transactions],
                "unparseable transaction count, skipping row");
            return;
        }
    };

    let record = store.record_mut(stop_code);
    record.info.name = Some(fields[columns.stop_name].clone());
    record.info.area = Some(fields[columns.area].clone());
    record.add_transactions(date, count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SNAPSHOT_V2;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use std::path::PathBuf;

    const HEADER: &str = "col0;col1;col2;col3;col4;col5;col6;col7;col8\n";

    fn write_snapshot(dir: &Path, name: &str, rows: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(HEADER.as_bytes()).unwrap();
        for row in rows {
            encoder.write_all(row.as_bytes()).unwrap();
            encoder.write_all(b"\n").unwrap();
        }
        encoder.finish().unwrap();
        path
    }

    fn row(stop: &str, date: &str, area: &str, name: &str, count: &str) -> String {
        format!("{stop};x;x;{date};x;x;{area};{name};{count}")
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_counts_sum_within_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(
            dir.path(),
            "a.gz",
            &[
                &row("PC1106", "2020-05-08", "LAS CONDES", "Municipalidad", "1"),
                &row("PC1106", "2020-05-08", "LAS CONDES", "Municipalidad", "2"),
            ],
        );

        let store = aggregate_snapshots(&[path], &SNAPSHOT_V2).unwrap();
        let record = store.get("PC1106").unwrap();
        assert_eq!(record.dates[&d("2020-05-08")], 3);
    }

    #[test]
    fn test_counts_sum_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_snapshot(
            dir.path(),
            "a.gz",
            &[&row("PC1106", "2020-05-08", "LAS CONDES", "Muni", "1")],
        );
        let b = write_snapshot(
            dir.path(),
            "b.gz",
            &[&row("PC1106", "2020-05-08", "LAS CONDES", "Muni", "2")],
        );

        let store = aggregate_snapshots(&[a, b], &SNAPSHOT_V2).unwrap();
        assert_eq!(store.get("PC1106").unwrap().dates[&d("2020-05-08")], 3);
    }

    #[test]
    fn test_static_fields_last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_snapshot(
            dir.path(),
            "a.gz",
            &[&row("PC1106", "2020-05-08", "PROVIDENCIA", "Old name", "1")],
        );
        let b = write_snapshot(
            dir.path(),
            "b.gz",
            &[&row("PC1106", "2020-05-09", "LAS CONDES", "New name", "1")],
        );

        let store = aggregate_snapshots(&[a, b], &SNAPSHOT_V2).unwrap();
        let info = &store.get("PC1106").unwrap().info;
        assert_eq!(info.area.as_deref(), Some("LAS CONDES"));
        assert_eq!(info.name.as_deref(), Some("New name"));
    }

    #[test]
    fn test_malformed_count_skips_row_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(
            dir.path(),
            "a.gz",
            &[
                &row("PC1106", "2020-05-08", "LAS CONDES", "Muni", "oops"),
                &row("PC1107", "2020-05-08", "LAS CONDES", "Other", "5"),
            ],
        );

        let store = aggregate_snapshots(&[path], &SNAPSHOT_V2).unwrap();
        // Bad row never reached the count accumulation.
        assert!(store.get("PC1106").is_none());
        assert_eq!(store.get("PC1107").unwrap().dates[&d("2020-05-08")], 5);
    }

    #[test]
    fn test_short_row_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(dir.path(), "a.gz", &["PC1106;2020-05-08;3"]);
        let store = aggregate_snapshots(&[path], &SNAPSHOT_V2).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_latin1_fields_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(HEADER.as_bytes()).unwrap();
        // Area "ÑUÑOA" encoded as Latin-1 bytes.
        encoder
            .write_all(b"PI62;x;x;2020-05-08;x;x;\xd1U\xd1OA;Plaza \xd1u\xf1oa;4\n")
            .unwrap();
        encoder.finish().unwrap();

        let store = aggregate_snapshots(&[path], &SNAPSHOT_V2).unwrap();
        let info = &store.get("PI62").unwrap().info;
        assert_eq!(info.area.as_deref(), Some("ÑUÑOA"));
        assert_eq!(info.name.as_deref(), Some("Plaza Ñuñoa"));
    }

    #[test]
    fn test_record_mut_auto_creates_empty_record() {
        let mut store = AggregateStore::new();
        let record = store.record_mut("NEW");
        assert_eq!(*record, StopRecord::default());
        assert!(store.contains("NEW"));
    }

    #[test]
    fn test_dates_keep_insertion_order() {
        let mut record = StopRecord::default();
        record.add_transactions(d("2020-05-09"), 1);
        record.add_transactions(d("2020-05-08"), 2);
        let dates: Vec<_> = record.dates.keys().copied().collect();
        assert_eq!(dates, vec![d("2020-05-09"), d("2020-05-08")]);
    }
}
