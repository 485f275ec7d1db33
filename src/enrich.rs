//! Geographic enrichment of aggregated stops from location reference
//! tables.
//!
//! Three sources cover the three identifier schemes: bus stops keyed by
//! user stop code, metro and commuter-rail stations keyed by station name.
//! The namespaces are disjoint, so the order the sources are applied in
//! does not matter, and re-applying a table is a no-op.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::aggregate::AggregateStore;
use crate::encoding::decode_field;
use crate::schema::{self, LocationColumns};

/// Stop identifier → (longitude, latitude), as the source table labels
/// them.
pub type LocationTable = HashMap<String, (f64, f64)>;

/// Loads one reference table using its positional layout. One header row
/// is skipped; rows with too few columns or unparseable coordinates are
/// skipped with a warning.
pub fn load_location_table(path: &Path, layout: &LocationColumns) -> Result<LocationTable> {
    let mut reader = ReaderBuilder::new()
        .delimiter(layout.delimiter)
        .flexible(true)
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("opening location table {}", path.display()))?;

    let mut table = LocationTable::new();
    for result in reader.byte_records() {
        let record = result?;
        let (Some(code), Some(lon), Some(lat)) = (
            record.get(layout.code),
            record.get(layout.longitude),
            record.get(layout.latitude),
        ) else {
            warn!(file = %path.display(), fields = record.len(),
                "reference row has too few columns, skipping");
            continue;
        };

        let code = decode_field(code);
        let coords = (
            decode_field(lon).parse::<f64>(),
            decode_field(lat).parse::<f64>(),
        );
        match coords {
            (Ok(longitude), Ok(latitude)) => {
                table.insert(code, (longitude, latitude));
            }
            _ => {
                warn!(file = %path.display(), stop = %code,
                    "unparseable coordinates, skipping row");
            }
        }
    }

    info!(file = %path.display(), entries = table.len(), "location table loaded");
    Ok(table)
}

/// Overlays coordinates for every key in `table` onto the store.
///
/// Keys not yet in the store are auto-created as empty records; they carry
/// no transaction dates and fall out later at report time. Store entries
/// absent from the table are left untouched.
pub fn apply_locations(store: &mut AggregateStore, table: &LocationTable) {
    for (stop_id, &(longitude, latitude)) in table {
        let record = store.record_mut(stop_id);
        record.info.longitude = Some(longitude);
        record.info.latitude = Some(latitude);
    }
}

pub fn enrich_bus_stops(store: &mut AggregateStore, inputs_dir: &Path) -> Result<()> {
    let table = load_location_table(&inputs_dir.join("stop.csv"), &schema::BUS_STOPS)?;
    apply_locations(store, &table);
    Ok(())
}

pub fn enrich_metro_stations(store: &mut AggregateStore, inputs_dir: &Path) -> Result<()> {
    let table = load_location_table(&inputs_dir.join("metro.csv"), &schema::METRO_STATIONS)?;
    apply_locations(store, &table);
    Ok(())
}

pub fn enrich_rail_stations(store: &mut AggregateStore, inputs_dir: &Path) -> Result<()> {
    let table = load_location_table(&inputs_dir.join("metrotren.csv"), &schema::RAIL_STATIONS)?;
    apply_locations(store, &table);
    Ok(())
}
