use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::application::ports::VerdictStorePort;
use crate::domain::{
    errors::{DomainError, DomainResult},
    history::{HistoryFilter, HistoryStats},
    verdict::{ImageSize, NewVerdict, Source, VerdictRecord},
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS verdicts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    source TEXT NOT NULL,
    session_id TEXT,
    cls INTEGER NOT NULL,
    reason TEXT NOT NULL,
    confidence REAL NOT NULL,
    bbox TEXT,
    image_width INTEGER NOT NULL,
    image_height INTEGER NOT NULL,
    model_name TEXT NOT NULL
)";

const COLUMNS: &str = "id, timestamp, source, session_id, cls, reason, confidence, bbox, \
                       image_width, image_height, model_name";

/// SQLite-backed verdict store.
pub struct SqliteVerdictStore {
    pool: SqlitePool,
}

impl SqliteVerdictStore {
    /// Opens (creating if missing) the database file and ensures the
    /// schema exists.
    pub async fn open(path: &Path) -> DomainResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Private in-memory database, one connection so every query sees
    /// the same data.
    pub async fn in_memory() -> DomainResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> DomainResult<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

/// Appends the filter's conditions as a WHERE clause. `extra` is an
/// additional fixed condition (e.g. a class constraint for stats).
fn push_where<'a>(
    qb: &mut QueryBuilder<'a, Sqlite>,
    filter: &'a HistoryFilter,
    extra: Option<&'static str>,
) {
    let mut prefix = " WHERE ";
    if let Some(source) = filter.source {
        qb.push(prefix).push("source = ").push_bind(source.as_str());
        prefix = " AND ";
    }
    if let Some(cls) = filter.cls {
        qb.push(prefix).push("cls = ").push_bind(cls);
        prefix = " AND ";
    }
    if let Some(from) = filter.date_from {
        qb.push(prefix)
            .push("date(timestamp) >= date(")
            .push_bind(from.to_string())
            .push(")");
        prefix = " AND ";
    }
    if let Some(to) = filter.date_to {
        qb.push(prefix)
            .push("date(timestamp) <= date(")
            .push_bind(to.to_string())
            .push(")");
        prefix = " AND ";
    }
    if let Some(cond) = extra {
        qb.push(prefix).push(cond);
    }
}

#[derive(FromRow)]
struct VerdictRow {
    id: i64,
    timestamp: String,
    source: String,
    session_id: Option<String>,
    cls: i64,
    reason: String,
    confidence: f64,
    bbox: Option<String>,
    image_width: i64,
    image_height: i64,
    model_name: String,
}

impl TryFrom<VerdictRow> for VerdictRecord {
    type Error = DomainError;

    fn try_from(row: VerdictRow) -> Result<Self, Self::Error> {
        let source = Source::parse(&row.source)
            .ok_or_else(|| DomainError::Storage(format!("unknown source '{}'", row.source)))?;
        let bbox = row
            .bbox
            .as_deref()
            .and_then(|s| serde_json::from_str::<[f32; 4]>(s).ok());
        Ok(VerdictRecord {
            id: row.id,
            timestamp: row.timestamp,
            source,
            session_id: row.session_id,
            cls: row.cls as u32,
            reason: row.reason,
            confidence: row.confidence as f32,
            bbox,
            image_size: ImageSize {
                width: row.image_width as u32,
                height: row.image_height as u32,
            },
            model_name: row.model_name,
        })
    }
}

impl SqliteVerdictStore {
    async fn count_with(
        &self,
        filter: &HistoryFilter,
        extra: Option<&'static str>,
    ) -> DomainResult<i64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM verdicts");
        push_where(&mut qb, filter, extra);
        let n: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(n)
    }
}

#[async_trait]
impl VerdictStorePort for SqliteVerdictStore {
    async fn insert(&self, verdict: NewVerdict) -> DomainResult<i64> {
        let bbox_json = verdict
            .bbox
            .map(|b| serde_json::to_string(&b))
            .transpose()
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO verdicts (timestamp, source, session_id, cls, reason, confidence, bbox, \
             image_width, image_height, model_name) \
             VALUES (datetime('now'), ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(verdict.source.as_str())
        .bind(&verdict.session_id)
        .bind(verdict.cls as i64)
        .bind(&verdict.reason)
        .bind(verdict.confidence as f64)
        .bind(&bbox_json)
        .bind(verdict.image_size.width as i64)
        .bind(verdict.image_size.height as i64)
        .bind(&verdict.model_name)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn count(&self, filter: &HistoryFilter) -> DomainResult<i64> {
        self.count_with(filter, None).await
    }

    async fn list(
        &self,
        filter: &HistoryFilter,
        limit: i64,
        offset: i64,
    ) -> DomainResult<(i64, Vec<VerdictRecord>)> {
        let total = self.count_with(filter, None).await?;

        let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM verdicts"));
        push_where(&mut qb, filter, None);
        qb.push(" ORDER BY id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<VerdictRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(VerdictRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((total, items))
    }

    async fn stats(&self, filter: &HistoryFilter) -> DomainResult<HistoryStats> {
        let total = self.count_with(filter, None).await?;
        let pass_count = self.count_with(filter, Some("cls = 0")).await?;
        let fail_count = self.count_with(filter, Some("cls != 0")).await?;
        Ok(HistoryStats {
            total,
            pass_count,
            fail_count,
        })
    }

    async fn get(&self, id: i64) -> DomainResult<Option<VerdictRecord>> {
        let row: Option<VerdictRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM verdicts WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(VerdictRecord::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM verdicts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn clear_all(&self) -> DomainResult<()> {
        sqlx::query("DELETE FROM verdicts").execute(&self.pool).await?;
        Ok(())
    }

    async fn clear_filtered(&self, filter: &HistoryFilter) -> DomainResult<u64> {
        let mut qb = QueryBuilder::new("DELETE FROM verdicts");
        push_where(&mut qb, filter, None);
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn export(&self, filter: &HistoryFilter) -> DomainResult<Vec<VerdictRecord>> {
        let mut qb = QueryBuilder::new(format!("SELECT {COLUMNS} FROM verdicts"));
        push_where(&mut qb, filter, None);
        qb.push(" ORDER BY id DESC");

        let rows: Vec<VerdictRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(VerdictRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(source: Source, cls: u32, confidence: f32) -> NewVerdict {
        NewVerdict {
            source,
            session_id: match source {
                Source::Realtime => Some("abcd1234".to_string()),
                Source::Upload => None,
            },
            cls,
            reason: "Tidak memenuhi standar kualitas.".to_string(),
            confidence,
            bbox: Some([10.0, 10.0, 50.0, 50.0]),
            image_size: ImageSize {
                width: 200,
                height: 200,
            },
            model_name: "best.onnx".to_string(),
        }
    }

    #[tokio::test]
    async fn ids_are_monotonically_increasing() {
        let store = SqliteVerdictStore::in_memory().await.unwrap();
        let a = store.insert(verdict(Source::Upload, 0, 0.9)).await.unwrap();
        let b = store.insert(verdict(Source::Upload, 1, 0.8)).await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn list_orders_newest_first_and_paginates() {
        let store = SqliteVerdictStore::in_memory().await.unwrap();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(store.insert(verdict(Source::Upload, i % 2, 0.9)).await.unwrap());
        }

        let (total, page) = store.list(&HistoryFilter::default(), 5, 0).await.unwrap();
        assert_eq!(total, 5);
        let listed: Vec<i64> = page.iter().map(|r| r.id).collect();
        ids.reverse();
        assert_eq!(listed, ids);

        // total reflects the match count, not the page size
        let (total, page) = store.list(&HistoryFilter::default(), 2, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, ids[2]);
    }

    #[tokio::test]
    async fn records_round_trip_through_the_store() {
        let store = SqliteVerdictStore::in_memory().await.unwrap();
        let id = store.insert(verdict(Source::Realtime, 1, 0.75)).await.unwrap();

        let rec = store.get(id).await.unwrap().unwrap();
        assert_eq!(rec.source, Source::Realtime);
        assert_eq!(rec.session_id.as_deref(), Some("abcd1234"));
        assert_eq!(rec.cls, 1);
        assert_eq!(rec.bbox, Some([10.0, 10.0, 50.0, 50.0]));
        assert_eq!(rec.image_size, ImageSize { width: 200, height: 200 });
        assert_eq!(rec.model_name, "best.onnx");
        assert!(!rec.timestamp.is_empty());
    }

    #[tokio::test]
    async fn get_missing_id_is_none_and_delete_is_idempotent() {
        let store = SqliteVerdictStore::in_memory().await.unwrap();
        assert!(store.get(42).await.unwrap().is_none());

        let id = store.insert(verdict(Source::Upload, 0, 0.9)).await.unwrap();
        assert_eq!(store.delete(id).await.unwrap(), 1);
        assert_eq!(store.delete(id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clear_all_empties_the_store() {
        let store = SqliteVerdictStore::in_memory().await.unwrap();
        store.insert(verdict(Source::Upload, 0, 0.9)).await.unwrap();
        store.clear_all().await.unwrap();
        let (total, page) = store.list(&HistoryFilter::default(), 50, 0).await.unwrap();
        assert_eq!(total, 0);
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn stats_pass_plus_fail_equals_total() {
        let store = SqliteVerdictStore::in_memory().await.unwrap();
        for cls in [0, 0, 1, 2, 3] {
            store.insert(verdict(Source::Upload, cls, 0.9)).await.unwrap();
        }
        let stats = store.stats(&HistoryFilter::default()).await.unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.pass_count, 2);
        assert_eq!(stats.fail_count, 3);
        assert_eq!(stats.pass_count + stats.fail_count, stats.total);
    }

    #[tokio::test]
    async fn filters_compose_over_source_and_class() {
        let store = SqliteVerdictStore::in_memory().await.unwrap();
        store.insert(verdict(Source::Upload, 0, 0.9)).await.unwrap();
        store.insert(verdict(Source::Upload, 1, 0.9)).await.unwrap();
        store.insert(verdict(Source::Realtime, 1, 0.9)).await.unwrap();

        let filter = HistoryFilter {
            source: Some(Source::Upload),
            ..Default::default()
        };
        assert_eq!(store.count(&filter).await.unwrap(), 2);

        let filter = HistoryFilter {
            source: Some(Source::Upload),
            cls: Some(1),
            ..Default::default()
        };
        assert_eq!(store.count(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn date_filters_compare_calendar_dates() {
        let store = SqliteVerdictStore::in_memory().await.unwrap();
        store.insert(verdict(Source::Upload, 0, 0.9)).await.unwrap();

        let today = chrono::Utc::now().date_naive();
        let filter = HistoryFilter {
            date_from: Some(today),
            date_to: Some(today),
            ..Default::default()
        };
        assert_eq!(store.count(&filter).await.unwrap(), 1);

        let filter = HistoryFilter {
            date_to: Some(chrono::NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()),
            ..Default::default()
        };
        assert_eq!(store.count(&filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn clear_filtered_deletes_only_matching_records() {
        let store = SqliteVerdictStore::in_memory().await.unwrap();
        store.insert(verdict(Source::Upload, 0, 0.9)).await.unwrap();
        store.insert(verdict(Source::Upload, 1, 0.9)).await.unwrap();
        store.insert(verdict(Source::Realtime, 1, 0.9)).await.unwrap();

        let filter = HistoryFilter {
            source: Some(Source::Upload),
            ..Default::default()
        };
        assert_eq!(store.clear_filtered(&filter).await.unwrap(), 2);

        let (total, page) = store.list(&HistoryFilter::default(), 50, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].source, Source::Realtime);
    }

    #[tokio::test]
    async fn export_returns_all_matches_newest_first() {
        let store = SqliteVerdictStore::in_memory().await.unwrap();
        let a = store.insert(verdict(Source::Upload, 0, 0.9)).await.unwrap();
        let b = store.insert(verdict(Source::Upload, 1, 0.8)).await.unwrap();

        let rows = store.export(&HistoryFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, b);
        assert_eq!(rows[1].id, a);
    }
}
