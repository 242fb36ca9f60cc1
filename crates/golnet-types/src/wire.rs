//! Compact wire form for rows of cells.
//!
//! A row travels as a string with one character per cell: `1` for alive,
//! `0` for dead. Coordinates are implied by position, so a decoded cell's
//! `x` is its column and its `y` is its row index within the sequence.
//! Owners that know the true row offset rewrite `y` themselves.

/// `#[serde(with = "crate::wire::rows")]` adapter for `Vec<Vec<Cell>>`.
pub mod rows {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::grid::Cell;

    const ALIVE: char = '1';
    const DEAD: char = '0';

    /// Encode each row as a string of `0`/`1`.
    pub fn serialize<S: Serializer>(rows: &[Vec<Cell>], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(rows.iter().map(|row| {
            row.iter()
                .map(|cell| if cell.alive { ALIVE } else { DEAD })
                .collect::<String>()
        }))
    }

    /// Decode rows written by [`serialize`].
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<Cell>>, D::Error> {
        let encoded = Vec::<String>::deserialize(deserializer)?;
        encoded
            .iter()
            .enumerate()
            .map(|(y, row)| {
                row.chars()
                    .enumerate()
                    .map(|(x, symbol)| match symbol {
                        ALIVE => Ok(Cell::new(x, y, true)),
                        DEAD => Ok(Cell::dead(x, y)),
                        other => Err(D::Error::custom(format!(
                            "row {y} column {x}: unexpected cell {other:?}"
                        ))),
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::{Deserialize, Serialize};

    use crate::grid::{Cell, Grid};
    use crate::world::World;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Rows(#[serde(with = "super::rows")] Vec<Vec<Cell>>);

    #[test]
    fn rows_are_strings_of_flags() {
        let rows = Rows(vec![
            vec![Cell::new(0, 0, true), Cell::dead(1, 0)],
            vec![Cell::dead(0, 1), Cell::new(1, 1, true)],
        ]);
        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json, serde_json::json!(["10", "01"]));
        assert_eq!(serde_json::from_value::<Rows>(json).unwrap(), rows);
    }

    #[test]
    fn unknown_symbols_are_rejected() {
        let err = serde_json::from_value::<Rows>(serde_json::json!(["10", "0x"])).unwrap_err();
        assert!(err.to_string().contains("row 1 column 1"), "{err}");
    }

    #[test]
    fn large_world_costs_about_one_byte_per_cell() {
        let world = World::new(Grid::new(1500, 1500), 4);
        let bytes = serde_json::to_vec(&world).unwrap();
        assert!(bytes.len() < 1500 * 1500 + 1500 * 8, "{} bytes", bytes.len());
    }
}
