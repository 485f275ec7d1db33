//! Positional column layouts for every upstream file format.
//!
//! The transaction dumps and reference tables carry no usable headers, and
//! their column offsets have shifted between upstream revisions. Every
//! offset lives here and is selected explicitly by the consuming code;
//! nothing indexes into a raw row inline.

/// Column offsets for one revision of the daily transaction snapshot
/// (semicolon-delimited, one header row).
#[derive(Debug, Clone, Copy)]
pub struct SnapshotColumns {
    pub stop_code: usize,
    pub date: usize,
    pub area: usize,
    pub stop_name: usize,
    pub transactions: usize,
}

impl SnapshotColumns {
    /// Minimum number of fields a data row must have to be usable.
    pub fn min_fields(&self) -> usize {
        1 + self
            .stop_code
            .max(self.date)
            .max(self.area)
            .max(self.stop_name)
            .max(self.transactions)
    }
}

/// Layout of the current `<date>.transaction.gz` dumps.
pub static SNAPSHOT_V2: SnapshotColumns = SnapshotColumns {
    stop_code: 0,
    date: 3,
    area: 6,
    stop_name: 7,
    transactions: 8,
};

/// Column offsets and delimiter for one location reference table.
#[derive(Debug, Clone, Copy)]
pub struct LocationColumns {
    pub delimiter: u8,
    pub code: usize,
    pub longitude: usize,
    pub latitude: usize,
}

/// `inputs/stop.csv` — bus stop registry keyed by user stop code.
pub static BUS_STOPS: LocationColumns = LocationColumns {
    delimiter: b',',
    code: 5,
    longitude: 7,
    latitude: 8,
};

/// `inputs/metro.csv` — metro stations keyed by station name.
pub static METRO_STATIONS: LocationColumns = LocationColumns {
    delimiter: b';',
    code: 0,
    longitude: 1,
    latitude: 2,
};

/// `inputs/metrotren.csv` — commuter-rail stations keyed by station name.
pub static RAIL_STATIONS: LocationColumns = LocationColumns {
    delimiter: b';',
    code: 0,
    longitude: 1,
    latitude: 2,
};
