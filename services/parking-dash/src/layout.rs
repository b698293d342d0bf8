// services/parking-dash/src/layout.rs
//
// Arranges display spots into the grid / rows / street layouts

use std::fmt;
use std::str::FromStr;

use parkkit::types::ParkingSpot;

use crate::presentation::{group_by_row, pair_rows_for_street_layout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    Grid,
    #[default]
    Rows,
    Street,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Grid, ViewMode::Rows, ViewMode::Street];

    pub fn next(self) -> Self {
        match self {
            ViewMode::Grid => ViewMode::Rows,
            ViewMode::Rows => ViewMode::Street,
            ViewMode::Street => ViewMode::Grid,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewMode::Grid => "Grid",
            ViewMode::Rows => "Rows",
            ViewMode::Street => "Street",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grid" => Ok(ViewMode::Grid),
            "rows" => Ok(ViewMode::Rows),
            "street" => Ok(ViewMode::Street),
            other => Err(format!("unknown view mode '{}' (expected grid, rows or street)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowGroup {
    pub row: u32,
    pub spots: Vec<ParkingSpot>,
}

/// Facing rows separated by the driving lane.
#[derive(Debug, Clone, PartialEq)]
pub struct StreetSection {
    pub bottom: RowGroup,
    pub top: Option<RowGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpotLayout {
    Grid(Vec<ParkingSpot>),
    Rows(Vec<RowGroup>),
    Street(Vec<StreetSection>),
}

impl SpotLayout {
    /// Spots in render order, used to map the cursor onto tiles.
    pub fn spots(&self) -> Vec<&ParkingSpot> {
        match self {
            SpotLayout::Grid(spots) => spots.iter().collect(),
            SpotLayout::Rows(groups) => groups.iter().flat_map(|g| g.spots.iter()).collect(),
            SpotLayout::Street(sections) => sections
                .iter()
                .flat_map(|s| {
                    s.top
                        .iter()
                        .flat_map(|g| g.spots.iter())
                        .chain(s.bottom.spots.iter())
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SpotLayout::Grid(spots) => spots.is_empty(),
            SpotLayout::Rows(groups) => groups.is_empty(),
            SpotLayout::Street(sections) => sections.is_empty(),
        }
    }
}

pub fn compose(spots: &[ParkingSpot], mode: ViewMode) -> SpotLayout {
    if mode == ViewMode::Grid {
        return SpotLayout::Grid(spots.to_vec());
    }

    let mut rows = group_by_row(spots);
    let keys: Vec<u32> = rows.keys().copied().collect();

    match mode {
        ViewMode::Rows => SpotLayout::Rows(
            rows.into_iter()
                .map(|(row, spots)| RowGroup { row, spots })
                .collect(),
        ),
        _ => {
            let mut take = |row: u32| RowGroup {
                row,
                spots: rows.remove(&row).unwrap_or_default(),
            };
            SpotLayout::Street(
                pair_rows_for_street_layout(&keys)
                    .into_iter()
                    .map(|pair| StreetSection {
                        bottom: take(pair.bottom),
                        top: pair.top.map(&mut take),
                    })
                    .collect(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spot(id: i64, row: u32) -> ParkingSpot {
        ParkingSpot {
            id,
            label: format!("R{}-S{}", row, id),
            row,
            occupied: id % 2 == 0,
        }
    }

    fn sample() -> Vec<ParkingSpot> {
        vec![spot(1, 3), spot(2, 1), spot(3, 2), spot(4, 1), spot(5, 3)]
    }

    #[test]
    fn test_grid_keeps_input_order() {
        let layout = compose(&sample(), ViewMode::Grid);
        let ids: Vec<i64> = layout.spots().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_rows_are_grouped_and_sorted() {
        let SpotLayout::Rows(groups) = compose(&sample(), ViewMode::Rows) else {
            panic!("expected rows layout");
        };
        let rows: Vec<u32> = groups.iter().map(|g| g.row).collect();
        assert_eq!(rows, vec![1, 2, 3]);
        assert_eq!(groups[0].spots.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn test_street_pairs_rows() {
        let SpotLayout::Street(sections) = compose(&sample(), ViewMode::Street) else {
            panic!("expected street layout");
        };
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].bottom.row, 1);
        assert_eq!(sections[0].top.as_ref().map(|g| g.row), Some(2));
        assert_eq!(sections[1].bottom.row, 3);
        assert!(sections[1].top.is_none());
        assert_eq!(compose(&sample(), ViewMode::Street).spots().len(), 5);
    }

    #[test]
    fn test_empty_input_yields_empty_layouts() {
        for mode in ViewMode::ALL {
            assert!(compose(&[], mode).is_empty());
        }
    }

    #[test]
    fn test_mode_cycle_and_parse() {
        assert_eq!(ViewMode::Grid.next(), ViewMode::Rows);
        assert_eq!(ViewMode::Street.next(), ViewMode::Grid);
        assert_eq!("STREET".parse::<ViewMode>(), Ok(ViewMode::Street));
        assert!("diagonal".parse::<ViewMode>().is_err());
    }
}
