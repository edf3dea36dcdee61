use std::fmt;

use super::matcher_types::{MatcherError, Point, PointSet, RawTable, Role};

const ID_IDX: usize = 0;
const LATITUDE_IDX: usize = 1;
const LONGITUDE_IDX: usize = 2;
const MIN_COLUMNS: usize = 3;

/// Which source column ended up in which canonical column, and how many rows
/// survived cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    pub role: Role,
    pub source_columns: [String; 3],
    pub rows_read: usize,
    pub rows_kept: usize,
}

impl ColumnMapping {
    #[inline]
    pub fn rows_dropped(&self) -> usize {
        self.rows_read - self.rows_kept
    }
}

impl fmt::Display for ColumnMapping {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let canonical = self.role.columns();
        writeln!(f, "Mapping columns in {} table:", self.role)?;
        for (i, (source, kind)) in self
            .source_columns
            .iter()
            .zip(&["ID", "LAT", "LONG"])
            .enumerate()
        {
            writeln!(f, "{}: {} -> {} ({})", i + 1, source, canonical[i], kind)?;
        }
        write!(
            f,
            "Valid rows: {} (dropped {})",
            self.rows_kept,
            self.rows_dropped()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub points: PointSet,
    pub mapping: ColumnMapping,
}

#[inline]
fn is_blank(cell: &str) -> bool {
    cell.trim().is_empty()
}

#[inline]
fn parse_coordinate(cell: Option<&String>) -> Option<f64> {
    cell.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Turns a raw table into the canonical (id, lat, long) point set of `role`.
///
/// Fully blank rows are dropped, columns 2 and 3 are coerced to numbers and
/// rows where either fails are dropped. Columns past the third are ignored.
pub fn normalize(raw: &RawTable, role: Role) -> Result<NormalizedTable, MatcherError> {
    let found = raw.column_count();
    if found < MIN_COLUMNS {
        return Err(MatcherError::InsufficientColumns { role, found });
    }

    let non_blank_rows: Vec<&Vec<String>> = raw
        .rows
        .iter()
        .filter(|row| !row.iter().all(|cell| is_blank(cell)))
        .collect();

    let points: Vec<Point> = non_blank_rows
        .iter()
        .filter_map(|row| {
            let latitude = parse_coordinate(row.get(LATITUDE_IDX))?;
            let longitude = parse_coordinate(row.get(LONGITUDE_IDX))?;
            let id = row.get(ID_IDX).cloned().unwrap_or_default();

            Some(Point::new(id, latitude, longitude))
        })
        .collect();

    if points.is_empty() {
        return Err(MatcherError::EmptyAfterValidation { role });
    }

    let mapping = ColumnMapping {
        role,
        source_columns: [
            raw.headers[ID_IDX].clone(),
            raw.headers[LATITUDE_IDX].clone(),
            raw.headers[LONGITUDE_IDX].clone(),
        ],
        rows_read: non_blank_rows.len(),
        rows_kept: points.len(),
    };

    Ok(NormalizedTable {
        points: PointSet::new(role, points),
        mapping,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn it_should_fail_with_two_columns() {
        let raw = table(&["id", "lat"], &[&["H1", "0.0"]]);

        assert_matches!(
            normalize(&raw, Role::Hp),
            Err(MatcherError::InsufficientColumns { role: Role::Hp, found: 2 })
        );
    }

    #[test]
    fn it_should_fail_when_no_coordinate_is_numeric() {
        let raw = table(
            &["id", "lat", "lon"],
            &[&["C1", "north", "east"], &["C2", "", "1.0"]],
        );

        assert_matches!(
            normalize(&raw, Role::Chid),
            Err(MatcherError::EmptyAfterValidation { role: Role::Chid })
        );
    }

    #[test]
    fn it_should_drop_a_row_with_a_non_numeric_latitude() {
        let raw = table(
            &["site", "y", "x"],
            &[&["H1", "abc", "1.0"], &["H2", "10.5", "-3.25"]],
        );

        let normalized = normalize(&raw, Role::Hp).unwrap();

        assert_eq!(normalized.points.points, vec![Point::new("H2", 10.5, -3.25)]);
        assert_eq!(normalized.mapping.rows_dropped(), 1);
    }

    #[test]
    fn it_should_fail_when_the_only_row_is_malformed() {
        let raw = table(&["site", "y", "x"], &[&["H1", "abc", "1.0"]]);

        assert_matches!(
            normalize(&raw, Role::Hp),
            Err(MatcherError::EmptyAfterValidation { role: Role::Hp })
        );
    }

    #[test]
    fn it_should_keep_only_the_first_three_columns_in_order() {
        let raw = table(
            &["id", "lat", "lon", "notes", "owner"],
            &[
                &["007", " 1.5 ", "2.5", "x", "y"],
                &["", "", "", "", ""],
                &["  ", " ", "", "", ""],
                &["008", "-1e1", "+3", "", ""],
            ],
        );

        let normalized = normalize(&raw, Role::Chid).unwrap();

        assert_eq!(
            normalized.points,
            PointSet::new(
                Role::Chid,
                vec![Point::new("007", 1.5, 2.5), Point::new("008", -10.0, 3.0)]
            )
        );
        // Blank rows are not counted as dropped.
        assert_eq!(normalized.mapping.rows_read, 2);
        assert_eq!(normalized.mapping.rows_dropped(), 0);
    }

    #[test]
    fn it_should_drop_short_rows_and_non_finite_values() {
        let raw = table(
            &["id", "lat", "lon"],
            &[&["H1", "1.0"], &["H2", "NaN", "1.0"], &["H3", "1.0", "inf"], &["H4", "2", "3"]],
        );

        let normalized = normalize(&raw, Role::Hp).unwrap();

        assert_eq!(normalized.points.points, vec![Point::new("H4", 2.0, 3.0)]);
    }

    #[test]
    fn it_should_describe_the_column_mapping() {
        let raw = table(&["HPID", "Latitude", "Longitude"], &[&["H1", "1", "2"]]);

        let summary = normalize(&raw, Role::Hp).unwrap().mapping.to_string();

        assert_eq!(
            summary,
            "Mapping columns in HP table:\n\
             1: HPID -> HP (ID)\n\
             2: Latitude -> HP_LAT (LAT)\n\
             3: Longitude -> HP_LONG (LONG)\n\
             Valid rows: 1 (dropped 0)"
        );
    }
}
