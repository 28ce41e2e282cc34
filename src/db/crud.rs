use sqlx::{Executor, Sqlite};

use super::{Category, FeatureRecord, StoreError};

/// 创建类别表，幂等
pub async fn create_table<'c, E>(executor: E, category: &Category) -> Result<(), StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {category} (
            name TEXT PRIMARY KEY,
            rows INTEGER NOT NULL,
            cols INTEGER NOT NULL,
            keypoints BLOB NOT NULL,
            descriptors BLOB NOT NULL
        )"
    );
    sqlx::query(&sql)
        .execute(executor)
        .await
        .map_err(|source| StoreError::Schema { category: category.to_string(), source })?;
    Ok(())
}

/// 插入一条特征记录
///
/// 刻意使用普通 INSERT 而非 upsert：重复主键返回 DuplicateKey，原记录不变
pub async fn insert<'c, E>(
    executor: E,
    category: &Category,
    record: &FeatureRecord,
) -> Result<(), StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let sql = format!(
        "INSERT INTO {category} (name, rows, cols, keypoints, descriptors) VALUES (?, ?, ?, ?, ?)"
    );
    sqlx::query(&sql)
        .bind(&record.name)
        .bind(record.rows)
        .bind(record.cols)
        .bind(&record.keypoints)
        .bind(&record.descriptors)
        .execute(executor)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateKey {
                category: category.to_string(),
                name: record.name.clone(),
            },
            _ => StoreError::Storage(e),
        })?;
    Ok(())
}

/// 按图片名查询一条记录
pub async fn get_record<'c, E>(
    executor: E,
    category: &Category,
    name: &str,
) -> Result<Option<FeatureRecord>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let sql = format!(
        "SELECT name, rows, cols, keypoints, descriptors FROM {category} WHERE name = ?"
    );
    let record = sqlx::query_as::<_, FeatureRecord>(&sql).bind(name).fetch_optional(executor).await?;
    Ok(record)
}

/// 查询类别表中的记录数量
pub async fn count_records<'c, E>(executor: E, category: &Category) -> Result<i64, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let sql = format!("SELECT COUNT(*) FROM {category}");
    let count: (i64,) = sqlx::query_as(&sql).fetch_one(executor).await?;
    Ok(count.0)
}
