use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// SQL dialect utilities
///
/// This module names the SQL dialects sqlshift can convert between and
/// provides the per-dialect wording used when prompting a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// Microsoft SQL Server (T-SQL)
    #[default]
    SqlServer,
    /// Snowflake
    Snowflake,
    /// PostgreSQL (PL/pgSQL)
    PostgreSql,
    /// MySQL / MariaDB
    MySql,
    /// Oracle (PL/SQL)
    Oracle,
    /// Google BigQuery
    BigQuery,
    /// SQLite
    Sqlite,
}

impl SqlDialect {
    /// All known dialects, in display order
    pub const ALL: [SqlDialect; 7] = [
        Self::SqlServer,
        Self::Snowflake,
        Self::PostgreSql,
        Self::MySql,
        Self::Oracle,
        Self::BigQuery,
        Self::Sqlite,
    ];

    // @returns: Human readable dialect name used in prompts and logs
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SqlServer => "MS SQL Server",
            Self::Snowflake => "Snowflake",
            Self::PostgreSql => "PostgreSQL",
            Self::MySql => "MySQL",
            Self::Oracle => "Oracle",
            Self::BigQuery => "BigQuery",
            Self::Sqlite => "SQLite",
        }
    }

    // @returns: Lowercase identifier used in configuration files
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::SqlServer => "sqlserver",
            Self::Snowflake => "snowflake",
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::Oracle => "oracle",
            Self::BigQuery => "bigquery",
            Self::Sqlite => "sqlite",
        }
    }

    /// Non-SQL language the target accepts for procedure bodies, which the
    /// conversion prompt tells the model to stay away from
    pub fn embedded_procedure_language(&self) -> Option<&'static str> {
        match self {
            Self::Snowflake | Self::BigQuery => Some("JavaScript"),
            Self::Oracle => Some("Java"),
            Self::PostgreSql => Some("PL/Python"),
            Self::SqlServer => Some("CLR (.NET)"),
            Self::MySql | Self::Sqlite => None,
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl std::str::FromStr for SqlDialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlserver" | "mssql" | "tsql" | "t-sql" | "sql server" | "ms sql server" => Ok(Self::SqlServer),
            "snowflake" => Ok(Self::Snowflake),
            "postgresql" | "postgres" | "pg" => Ok(Self::PostgreSql),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "oracle" | "plsql" => Ok(Self::Oracle),
            "bigquery" | "bq" => Ok(Self::BigQuery),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(anyhow!("Unknown SQL dialect: {}", s)),
        }
    }
}
