//! Department names.
//!
//! A department is a caller-influenced routing key: it names the directory an
//! image is stored under and the table its record is written to. The
//! constraints below keep it safe in both places.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Department`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DepartmentError {
    /// The input is empty after trimming.
    #[error("department cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("department must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside the allowed set.
    #[error("department contains invalid character {0:?}")]
    InvalidCharacter(char),
    /// The input starts with a separator character.
    #[error("department must start with a letter or digit")]
    LeadingSeparator,
}

/// A validated department name.
///
/// ## Constraints
///
/// - Length: 1-48 characters after trimming
/// - ASCII letters, digits, space, `-` and `_` only
/// - Must start with a letter or digit
///
/// The character set rules out path separators, `..` and quotes, so the
/// value can be used verbatim as a directory name and inside a quoted SQL
/// identifier.
///
/// ## Examples
///
/// ```
/// use photobooth_core::Department;
///
/// assert!(Department::parse("Engineering").is_ok());
/// assert!(Department::parse("Human Resources").is_ok());
///
/// assert!(Department::parse("../etc").is_err());
/// assert!(Department::parse("sales/emea").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct Department(String);

impl Department {
    /// Maximum length of a department name.
    ///
    /// `employees_` plus this many bytes stays within the 63-byte
    /// `PostgreSQL` identifier limit.
    pub const MAX_LENGTH: usize = 48;

    /// Prefix of the per-department record table.
    pub const TABLE_PREFIX: &'static str = "employees_";

    /// Parse a `Department` from a string.
    ///
    /// # Errors
    ///
    /// Returns a [`DepartmentError`] describing the first violated constraint.
    pub fn parse(s: &str) -> Result<Self, DepartmentError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DepartmentError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(DepartmentError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_')))
        {
            return Err(DepartmentError::InvalidCharacter(c));
        }

        if !s.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            return Err(DepartmentError::LeadingSeparator);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the department name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the table holding this department's employee records.
    #[must_use]
    pub fn table_name(&self) -> String {
        format!("{}{}", Self::TABLE_PREFIX, self.0)
    }

    /// Recover a department from a record table name.
    ///
    /// Returns `None` for tables that are not department collections.
    #[must_use]
    pub fn from_table_name(table: &str) -> Option<Self> {
        table
            .strip_prefix(Self::TABLE_PREFIX)
            .and_then(|name| Self::parse(name).ok())
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Department {
    type Err = DepartmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Department {
    type Error = DepartmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Department> for String {
    fn from(department: Department) -> Self {
        department.0
    }
}

impl AsRef<str> for Department {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Department {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Department {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Department {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(Department::parse("Engineering").is_ok());
        assert!(Department::parse("Human Resources").is_ok());
        assert!(Department::parse("ops_2").is_ok());
        assert!(Department::parse("front-desk").is_ok());
    }

    #[test]
    fn test_parse_trims() {
        let dept = Department::parse("  Marketing ").unwrap();
        assert_eq!(dept.as_str(), "Marketing");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Department::parse(""), Err(DepartmentError::Empty));
        assert_eq!(Department::parse("\t "), Err(DepartmentError::Empty));
    }

    #[test]
    fn test_parse_rejects_path_traversal() {
        assert_eq!(
            Department::parse("../secrets"),
            Err(DepartmentError::InvalidCharacter('.'))
        );
        assert_eq!(
            Department::parse("sales/emea"),
            Err(DepartmentError::InvalidCharacter('/'))
        );
        assert_eq!(
            Department::parse("sales\\emea"),
            Err(DepartmentError::InvalidCharacter('\\'))
        );
    }

    #[test]
    fn test_parse_rejects_punctuation() {
        assert_eq!(
            Department::parse("R&D"),
            Err(DepartmentError::InvalidCharacter('&'))
        );
    }

    #[test]
    fn test_parse_rejects_sql_quote() {
        assert_eq!(
            Department::parse("a\"; DROP TABLE x; --"),
            Err(DepartmentError::InvalidCharacter('"'))
        );
    }

    #[test]
    fn test_parse_rejects_leading_separator() {
        assert_eq!(
            Department::parse("-ops"),
            Err(DepartmentError::LeadingSeparator)
        );
        assert_eq!(
            Department::parse("_ops"),
            Err(DepartmentError::LeadingSeparator)
        );
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(Department::MAX_LENGTH + 1);
        assert!(matches!(
            Department::parse(&long),
            Err(DepartmentError::TooLong { .. })
        ));
        assert!(Department::parse(&"a".repeat(Department::MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_table_name_round_trip() {
        let dept = Department::parse("Engineering").unwrap();
        assert_eq!(dept.table_name(), "employees_Engineering");
        assert_eq!(Department::from_table_name("employees_Engineering"), Some(dept));
        assert_eq!(Department::from_table_name("session"), None);
    }

    #[test]
    fn test_table_name_fits_identifier_limit() {
        let dept = Department::parse(&"x".repeat(Department::MAX_LENGTH)).unwrap();
        assert!(dept.table_name().len() <= 63);
    }
}
