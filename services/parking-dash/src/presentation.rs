// services/parking-dash/src/presentation.rs
//
// Pure mapping from backend records to display models

use std::collections::BTreeMap;

use parkkit::types::{BackendSpotRecord, ParkingSpot};

/// Row used when a record carries no row (or row 0).
pub const DEFAULT_ROW: u32 = 1;

const OCCUPIED_STATUS: &str = "occupied";

/// Map a backend record to a display spot.
///
/// A spot is occupied when `spot_status` is exactly `"occupied"` or the
/// boolean `ocupado` is set; either field alone is enough. The label is the explicit one or `R{row}-S{slot}`,
/// where the slot falls back to the spot id.
pub fn to_display_spot(record: &BackendSpotRecord) -> ParkingSpot {
    let occupied =
        record.spot_status.as_deref() == Some(OCCUPIED_STATUS) || record.ocupado == Some(true);

    let row = record.row.filter(|r| *r > 0).unwrap_or(DEFAULT_ROW);

    let label = match record.label.as_deref().map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => {
            let slot = record
                .slot_number
                .map(i64::from)
                .unwrap_or(record.id);
            spot_label(row, slot)
        }
    };

    ParkingSpot {
        id: record.id,
        label,
        row,
        occupied,
    }
}

pub fn to_display_spots(records: &[BackendSpotRecord]) -> Vec<ParkingSpot> {
    records.iter().map(to_display_spot).collect()
}

pub fn spot_label(row: u32, slot: i64) -> String {
    format!("R{}-S{}", row, slot)
}

/// Group spots by row, rows ascending numerically, input order kept within a row.
pub fn group_by_row(spots: &[ParkingSpot]) -> BTreeMap<u32, Vec<ParkingSpot>> {
    let mut rows: BTreeMap<u32, Vec<ParkingSpot>> = BTreeMap::new();
    for spot in spots {
        let row = if spot.row == 0 { DEFAULT_ROW } else { spot.row };
        rows.entry(row).or_default().push(spot.clone());
    }
    rows
}

/// Two facing rows of the street layout. `top` is absent for an odd last row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreetPair {
    pub bottom: u32,
    pub top: Option<u32>,
}

/// Pair consecutive sorted row keys: (1,2), (3,4), ...
pub fn pair_rows_for_street_layout(sorted_rows: &[u32]) -> Vec<StreetPair> {
    sorted_rows
        .chunks(2)
        .map(|pair| StreetPair {
            bottom: pair[0],
            top: pair.get(1).copied(),
        })
        .collect()
}

/// `0.45` -> `"45%"`. Values outside `0.0..=1.0` are clamped.
pub fn format_occupancy(fraction: f64) -> String {
    if !fraction.is_finite() {
        return "N/A".to_string();
    }
    format!("{:.0}%", fraction.clamp(0.0, 1.0) * 100.0)
}

pub fn status_label(occupied: bool) -> &'static str {
    if occupied {
        "Occupied"
    } else {
        "Free"
    }
}

/// Occupied and total counts for a set of spots.
pub fn occupancy_counts(spots: &[ParkingSpot]) -> (usize, usize) {
    let occupied = spots.iter().filter(|s| s.occupied).count();
    (occupied, spots.len())
}

pub fn occupancy_summary(spots: &[ParkingSpot]) -> String {
    let (occupied, total) = occupancy_counts(spots);
    format!("{}/{} occupied", occupied, total)
}
