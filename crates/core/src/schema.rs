//! Table schemas as plain data.
//!
//! Entity crates declare their column constraints (length, nullability,
//! uniqueness, default) as constant data. The persistence gateway validates
//! attribute sets against these specs before a row is written, and the
//! Postgres backend mirrors them in its DDL.

use crate::error::{DomainError, DomainResult};

/// Constraint set for a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    /// Maximum length in characters for text columns.
    pub max_len: Option<usize>,
    /// NOT NULL at the storage level.
    pub required: bool,
    /// Backed by a unique index; the index is the source of truth for
    /// uniqueness, handler pre-checks are advisory only.
    pub unique: bool,
}

impl ColumnSpec {
    /// Check a text attribute against this column's constraints.
    ///
    /// `None` (or an all-whitespace value) counts as missing.
    pub fn check_text(&self, value: Option<&str>) -> DomainResult<()> {
        match value {
            None => {
                if self.required {
                    return Err(DomainError::validation(format!(
                        "el campo {} es obligatorio",
                        self.name
                    )));
                }
                Ok(())
            }
            Some(v) => {
                if self.required && v.trim().is_empty() {
                    return Err(DomainError::validation(format!(
                        "el campo {} es obligatorio",
                        self.name
                    )));
                }
                if let Some(max) = self.max_len {
                    if v.chars().count() > max {
                        return Err(DomainError::validation(format!(
                            "el campo {} no puede exceder {max} caracteres",
                            self.name
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

/// Column constraints for one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub table: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of the columns carrying a unique index.
    pub fn unique_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().filter(|c| c.unique).map(|c| c.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: ColumnSpec = ColumnSpec {
        name: "name",
        max_len: Some(5),
        required: true,
        unique: false,
    };

    const NICKNAME: ColumnSpec = ColumnSpec {
        name: "nickname",
        max_len: Some(5),
        required: false,
        unique: false,
    };

    #[test]
    fn required_column_rejects_missing_and_blank_values() {
        assert!(NAME.check_text(None).is_err());
        assert!(NAME.check_text(Some("")).is_err());
        assert!(NAME.check_text(Some("   ")).is_err());
        assert!(NAME.check_text(Some("ok")).is_ok());
    }

    #[test]
    fn optional_column_accepts_missing_values() {
        assert!(NICKNAME.check_text(None).is_ok());
    }

    #[test]
    fn max_len_is_counted_in_characters() {
        assert!(NAME.check_text(Some("ñandú")).is_ok());
        assert!(NAME.check_text(Some("ñandús")).is_err());
    }

    #[test]
    fn schema_lookups_by_column_name() {
        const SCHEMA: TableSchema = TableSchema {
            table: "things",
            columns: &[NAME, NICKNAME],
        };

        assert_eq!(SCHEMA.column("name"), Some(&NAME));
        assert!(SCHEMA.column("missing").is_none());
        assert_eq!(SCHEMA.unique_columns().count(), 0);
    }
}
