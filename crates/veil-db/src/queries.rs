//! Database query functions organized by domain.

pub mod disclosure;
pub mod ledger;
pub mod quiz;
pub mod skill;

use std::str::FromStr;

use rusqlite::types::Type;
use veil_types::ParseError;

use crate::{DbError, Result};

/// Convert an unsigned counter or timestamp for an INTEGER column.
///
/// SQLite integers are signed 64-bit; values above `i64::MAX` are refused
/// instead of wrapping negative.
pub(crate) fn sql_int(value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| DbError::Serialization(format!("{value} exceeds SQLite INTEGER range")))
}

/// Parse a stored enum label inside a row mapper.
pub(crate) fn parse_label<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseError>,
{
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_int_range() {
        assert_eq!(sql_int(42).expect("in range"), 42);
        assert_eq!(sql_int(i64::MAX as u64).expect("max"), i64::MAX);
        assert!(matches!(
            sql_int(i64::MAX as u64 + 1),
            Err(DbError::Serialization(_))
        ));
    }
}
