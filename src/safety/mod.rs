//! SQL validation gate.
//!
//! Generated text is only executed when it starts with one of the allowed
//! statement verbs. Anything else is turned into a fixed refusal reply.
//!
//! The check is a case-sensitive prefix match on the trimmed text. It does
//! not parse SQL: `DELETE FROM Track` with no `WHERE` clause passes, and so
//! does a `SELECT ...; DROP TABLE ...` pair if the driver accepts it.

use std::fmt;

/// Statement verbs the gate lets through.
pub const ALLOWED_VERBS: [&str; 4] = ["SELECT", "INSERT", "UPDATE", "DELETE"];

/// Reply used when the generated text is not an allowed statement.
pub const REFUSAL_MESSAGE: &str = "I'm sorry, I couldn't generate a valid answer based on your question. Could you please rephrase it or ask another question?";

/// Result of passing generated text through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The trimmed statement, ready for execution.
    Valid(String),
    /// Not an allowed statement.
    Rejected,
}

impl Validation {
    /// Returns true if the text passed the gate.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(sql) => write!(f, "Valid({sql})"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// Checks generated text against [`ALLOWED_VERBS`].
pub fn validate_sql(text: &str) -> Validation {
    let trimmed = text.trim();

    if ALLOWED_VERBS.iter().any(|verb| trimmed.starts_with(verb)) {
        Validation::Valid(trimmed.to_string())
    } else {
        Validation::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_verbs_pass() {
        assert_eq!(
            validate_sql("SELECT Name FROM Artist LIMIT 10;"),
            Validation::Valid("SELECT Name FROM Artist LIMIT 10;".to_string())
        );
        assert!(validate_sql("INSERT INTO Artist (Name) VALUES ('x')").is_valid());
        assert!(validate_sql("UPDATE Artist SET Name = 'y' WHERE ArtistId = 1").is_valid());
        assert!(validate_sql("DELETE FROM Artist WHERE ArtistId = 1").is_valid());
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(
            validate_sql("  \n SELECT 1 \n"),
            Validation::Valid("SELECT 1".to_string())
        );
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        assert_eq!(validate_sql("select Name from Artist"), Validation::Rejected);
        assert_eq!(validate_sql("Select 1"), Validation::Rejected);
    }

    #[test]
    fn test_other_text_rejected() {
        assert_eq!(validate_sql("I don't know"), Validation::Rejected);
        assert_eq!(validate_sql("DROP TABLE Artist"), Validation::Rejected);
        assert_eq!(validate_sql("WITH t AS (SELECT 1) SELECT * FROM t"), Validation::Rejected);
        assert_eq!(validate_sql("```sql\nSELECT 1\n```"), Validation::Rejected);
        assert_eq!(validate_sql(""), Validation::Rejected);
        assert_eq!(validate_sql("   "), Validation::Rejected);
    }

    #[test]
    fn test_unfiltered_destructive_statement_passes() {
        assert!(validate_sql("DELETE FROM Track").is_valid());
    }

    #[test]
    fn test_display() {
        assert_eq!(Validation::Rejected.to_string(), "Rejected");
        assert_eq!(
            Validation::Valid("SELECT 1".to_string()).to_string(),
            "Valid(SELECT 1)"
        );
    }
}
