/// Outcome of the last parse attempt, as recorded on hubs and articles
use std::fmt;

/// Represents how the last parse of a hub or article ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseStatus {
    /// Page was fetched and its data extracted
    Success,

    /// Page could not be fetched
    Failed,
}

impl ParseStatus {
    /// Returns true if this represents a successful parse
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None for values written by other tools that this crate does
    /// not recognise.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ParseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_strings() {
        assert_eq!(ParseStatus::Success.to_db_string(), "success");
        assert_eq!(ParseStatus::from_db_string("failed"), Some(ParseStatus::Failed));
        assert_eq!(ParseStatus::from_db_string("Success!"), None);
    }

    #[test]
    fn test_is_success() {
        assert!(ParseStatus::Success.is_success());
        assert!(!ParseStatus::Failed.is_success());
    }
}
