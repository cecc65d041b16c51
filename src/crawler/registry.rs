//! Static lookup of task types and storage dialects
//!
//! Both registries are closed sets resolved once at startup. An unknown key
//! is a configuration error and is never defaulted.

use crate::ConfigError;

/// Kind of work a tick dispatches, each with its own extraction strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Listing pages, extracted with `HubExtraction`
    Hubs,

    /// Article pages, extracted with `ArticleExtraction`
    Articles,
}

impl TaskKind {
    /// Resolves a task-type key
    ///
    /// `"habrs"` is accepted as an alias of `"hubs"`.
    pub fn resolve(key: &str) -> Result<Self, ConfigError> {
        match key {
            "hubs" | "habrs" => Ok(Self::Hubs),
            "articles" => Ok(Self::Articles),
            _ => Err(ConfigError::UnknownKey {
                kind: "task type",
                key: key.to_string(),
            }),
        }
    }

    /// Canonical key
    pub fn key(&self) -> &'static str {
        match self {
            Self::Hubs => "hubs",
            Self::Articles => "articles",
        }
    }

    /// Name recorded in the parser log for this kind of work
    pub fn parser_name(&self) -> &'static str {
        match self {
            Self::Hubs => "Hubs parser",
            Self::Articles => "Articles parser",
        }
    }
}

/// Storage backends this build can open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageDialect {
    /// SQLite database file
    Sqlite,

    /// Private in-memory SQLite database, gone when the process exits
    SqliteMemory,
}

impl StorageDialect {
    /// Resolves a storage dialect key
    pub fn resolve(key: &str) -> Result<Self, ConfigError> {
        match key {
            "sqlite" => Ok(Self::Sqlite),
            "sqlite-memory" => Ok(Self::SqliteMemory),
            _ => Err(ConfigError::UnknownKey {
                kind: "storage dialect",
                key: key.to_string(),
            }),
        }
    }

    /// Returns true if the dialect stores data at `database-path`
    pub fn needs_path(&self) -> bool {
        matches!(self, Self::Sqlite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_task_kinds() {
        assert_eq!(TaskKind::resolve("hubs").unwrap(), TaskKind::Hubs);
        assert_eq!(TaskKind::resolve("habrs").unwrap(), TaskKind::Hubs);
        assert_eq!(TaskKind::resolve("articles").unwrap(), TaskKind::Articles);
        assert_eq!(TaskKind::Articles.key(), "articles");
    }

    #[test]
    fn test_unknown_task_kind() {
        let err = TaskKind::resolve("Articles").unwrap_err();
        assert_eq!(err.to_string(), "Unknown task type \"Articles\"");
    }

    #[test]
    fn test_resolve_dialects() {
        assert_eq!(StorageDialect::resolve("sqlite").unwrap(), StorageDialect::Sqlite);
        assert_eq!(
            StorageDialect::resolve("sqlite-memory").unwrap(),
            StorageDialect::SqliteMemory
        );
        assert!(StorageDialect::Sqlite.needs_path());
        assert!(!StorageDialect::SqliteMemory.needs_path());
    }

    #[test]
    fn test_unknown_dialect() {
        assert!(matches!(
            StorageDialect::resolve("mysql"),
            Err(ConfigError::UnknownKey {
                kind: "storage dialect",
                ..
            })
        ));
    }
}
