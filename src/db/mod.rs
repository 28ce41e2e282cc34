use std::fmt;
use std::path::Path;

use log::info;
use sqlx::{SqlitePool, sqlite::*};
use thiserror::Error;

pub mod crud;
pub mod model;

pub use model::*;

pub type Database = SqlitePool;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record {name:?} already exists in table {category}")]
    DuplicateKey { category: String, name: String },
    #[error("failed to create table {category}")]
    Schema {
        category: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("invalid category name {0:?}")]
    InvalidCategory(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

/// 类别名，同时作为表名使用
///
/// 表名无法作为参数绑定，只能拼接进 SQL，因此这里强制只允许标识符字符
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Result<Self, StoreError> {
        let name = name.into();
        let mut chars = name.chars();
        let head = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if head && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Ok(Self(name))
        } else {
            Err(StoreError::InvalidCategory(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 初始化数据库连接，整个批次共用一个连接池
pub async fn init_db(filename: impl AsRef<Path>) -> Result<Database, StoreError> {
    let filename = filename.as_ref();
    info!("初始化数据库连接: {}", filename.display());

    if let Some(parent) = filename.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .filename(filename)
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_accepts_identifiers() {
        assert!(Category::new("egypt_banknote_back").is_ok());
        assert!(Category::new("_front2").is_ok());
    }

    #[test]
    fn category_rejects_non_identifiers() {
        for name in ["", "2front", "front back", "front;drop table x", "front-back"] {
            assert!(
                matches!(Category::new(name), Err(StoreError::InvalidCategory(_))),
                "{name:?} should be rejected"
            );
        }
    }
}
