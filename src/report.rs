//! Flattening the enriched aggregate into report rows and CSV output.

use serde::Serialize;
use std::path::Path;
use tracing::warn;

use crate::aggregate::AggregateStore;

/// One output row. Field names double as the CSV header, matching the
/// historical artifact byte for byte.
///
/// The upstream stop table's longitude/latitude columns are themselves
/// swapped, so what the pipeline tracks as `longitude` lands under
/// `latitud` here; the published files have always looked this way and the
/// map template expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub fecha: String,
    pub nombre: String,
    pub comuna: String,
    pub latitud: f64,
    pub longitud: f64,
    pub subidas: u64,
}

/// Flattens the store into rows: one per (stop, date), in stop insertion
/// order then date insertion order.
///
/// A stop missing any of name, area, longitude or latitude is excluded
/// entirely, with a diagnostic naming the stop and the first missing
/// attribute. Nothing is ever zero-filled.
pub fn build_rows(store: &AggregateStore) -> Vec<ReportRow> {
    let mut rows = Vec::new();
    for (stop_id, record) in store.iter() {
        let info = &record.info;
        let (Some(_), Some(area), Some(longitude), Some(latitude)) =
            (&info.name, &info.area, info.longitude, info.latitude)
        else {
            if let Some(missing) = info.missing_attribute() {
                warn!(stop = %stop_id, missing, "stop excluded from report");
            }
            continue;
        };

        for (date, &count) in &record.dates {
            rows.push(ReportRow {
                fecha: format!("{} 00:00:00", date.format("%Y-%m-%d")),
                nombre: stop_id.to_string(),
                comuna: area.clone(),
                latitud: longitude,
                longitud: latitude,
                subidas: count,
            });
        }
    }
    rows
}

/// Writes the rows as CSV with the `fecha,nombre,comuna,latitud,longitud,
/// subidas` header.
pub fn write_csv(path: &Path, rows: &[ReportRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        // serialize() derives the header from the first record, so an empty
        // report writes it explicitly.
        writer.write_record(["fecha", "nombre", "comuna", "latitud", "longitud", "subidas"])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
