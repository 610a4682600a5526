// =============================================================================
// Row mapping
// =============================================================================
// Map typed rows to record structs, accumulating per-row errors.

use super::row::{Row, RowError};

/// Types that can be built from one result row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, RowError>;
}

/// Map every row, failing with all row errors at once.
pub fn map_rows<T: FromRow>(rows: &[Row]) -> Result<Vec<T>, RowError> {
    let mut results = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        match T::from_row(row) {
            Ok(item) => results.push(item),
            Err(e) => errors.push(format!("Row {idx}: {e}")),
        }
    }

    if !errors.is_empty() {
        return Err(RowError::Multiple(errors));
    }

    Ok(results)
}

/// Read the first row, if any.
pub fn map_first<T: FromRow>(rows: &[Row]) -> Result<Option<T>, RowError> {
    rows.first().map(T::from_row).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparql::RdfValue;
    use assert_matches::assert_matches;

    #[derive(Debug, PartialEq)]
    struct Counted {
        uri: String,
        count: usize,
    }

    impl FromRow for Counted {
        fn from_row(row: &Row) -> Result<Self, RowError> {
            Ok(Self {
                uri: row.iri("uri")?.to_string(),
                count: row.count("count")?,
            })
        }
    }

    fn counted(uri: &str, count: &str) -> Row {
        Row::new()
            .with("uri", RdfValue::iri(uri))
            .with("count", RdfValue::literal(count))
    }

    #[test]
    fn test_map_rows() {
        let rows = vec![counted("http://a", "1"), counted("http://b", "4")];
        let mapped: Vec<Counted> = map_rows(&rows).unwrap();
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[1].count, 4);
    }

    #[test]
    fn test_map_rows_collects_every_failure() {
        let rows = vec![
            counted("http://a", "x"),
            counted("http://b", "2"),
            Row::new().with("count", RdfValue::literal("1")),
        ];
        let err = map_rows::<Counted>(&rows).unwrap_err();
        assert_matches!(&err, RowError::Multiple(errors) if errors.len() == 2);
        assert!(err.to_string().contains("Row 0:"));
        assert!(err.to_string().contains("Row 2: Variable 'uri' is unbound"));
    }

    #[test]
    fn test_map_first() {
        assert_eq!(map_first::<Counted>(&[]).unwrap(), None);
        let first = map_first::<Counted>(&[counted("http://a", "7")]).unwrap();
        assert_eq!(first.map(|c| c.uri), Some("http://a".to_string()));
    }
}
