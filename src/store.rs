use crate::decode::MetricSet;
use chrono::Utc;
use sqlx::{Connection, PgConnection};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to connect to store: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("insert failed: {0}")]
    Insert(#[source] sqlx::Error),
}

/// Seam between the ingest loop and the store, so message handling can be
/// exercised against a capturing sink in tests.
pub(crate) trait RowSink {
    async fn write_row(&mut self, device: &str, metrics: &MetricSet) -> Result<(), StoreError>;
}

/// Writer over the QuestDB PostgreSQL wire. Holds the single process-wide
/// connection: opened lazily on the first write, reused for every row after
/// that, closed explicitly on shutdown. Inserts are auto-commit, one row per
/// call; the caller is responsible for never passing an empty metric set.
pub struct SensorStore {
    url: String,
    table: String,
    conn: Option<PgConnection>,
}

impl SensorStore {
    pub fn new(url: String, table: String) -> Self {
        Self {
            url,
            table,
            conn: None,
        }
    }

    async fn connection(&mut self) -> Result<&mut PgConnection, StoreError> {
        match self.conn {
            Some(ref mut conn) => Ok(conn),
            None => {
                let conn = PgConnection::connect(&self.url)
                    .await
                    .map_err(StoreError::Connect)?;
                tracing::info!(table = %self.table, "connected to store");
                Ok(self.conn.insert(conn))
            }
        }
    }

    pub async fn write(&mut self, device: &str, metrics: &MetricSet) -> Result<(), StoreError> {
        let sql = insert_statement(&self.table, metrics);
        let conn = self.connection().await?;

        let mut query = sqlx::query(&sql).bind(device);
        if let Some(value) = metrics.temperature {
            query = query.bind(value);
        }
        if let Some(value) = metrics.pressure {
            query = query.bind(value);
        }
        if let Some(value) = metrics.rotational_speed {
            query = query.bind(value);
        }
        query = query.bind(Utc::now());

        query.execute(conn).await.map_err(StoreError::Insert)?;
        tracing::info!(device, ?metrics, "wrote sensor row");
        Ok(())
    }

    pub async fn close(self) {
        if let Some(conn) = self.conn {
            if let Err(err) = conn.close().await {
                tracing::debug!(error=%err, "error closing store connection");
            }
        }
    }
}

impl RowSink for SensorStore {
    async fn write_row(&mut self, device: &str, metrics: &MetricSet) -> Result<(), StoreError> {
        self.write(device, metrics).await
    }
}

/// Column list is built per row: `device` always leads, the sparse metric
/// columns follow in a fixed order, and the writer-assigned timestamp closes
/// the row.
fn insert_statement(table: &str, metrics: &MetricSet) -> String {
    let mut columns = vec!["device"];
    if metrics.temperature.is_some() {
        columns.push("temp");
    }
    if metrics.pressure.is_some() {
        columns.push("tryk");
    }
    if metrics.rotational_speed.is_some() {
        columns.push("rpm");
    }
    columns.push("timestamp");

    let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${n}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(","),
        placeholders.join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::{insert_statement, SensorStore};
    use crate::decode::MetricSet;
    use anyhow::Result;
    use sqlx::Connection;
    use std::env;

    fn full_set() -> MetricSet {
        MetricSet {
            temperature: Some(22.5),
            pressure: Some(2.2),
            rotational_speed: Some(1000),
        }
    }

    #[test]
    fn insert_statement_with_all_metrics() {
        assert_eq!(
            insert_statement("sensor_data", &full_set()),
            "INSERT INTO sensor_data (device,temp,tryk,rpm,timestamp) VALUES ($1,$2,$3,$4,$5)"
        );
    }

    #[test]
    fn insert_statement_is_sparse() {
        let set = MetricSet {
            temperature: None,
            pressure: Some(2.2),
            rotational_speed: None,
        };
        assert_eq!(
            insert_statement("sensor_data", &set),
            "INSERT INTO sensor_data (device,tryk,timestamp) VALUES ($1,$2,$3)"
        );

        let set = MetricSet {
            temperature: Some(21.0),
            pressure: None,
            rotational_speed: Some(850),
        };
        assert_eq!(
            insert_statement("sensor_data", &set),
            "INSERT INTO sensor_data (device,temp,rpm,timestamp) VALUES ($1,$2,$3,$4)"
        );
    }

    // Live-store test, opt-in the same way the rest of the stack gates its
    // integration tests: INGESTOR_INTEGRATION_TEST=1 plus a reachable
    // INGESTOR_TEST_DATABASE_URL.
    #[tokio::test]
    async fn test_store_writes_sparse_rows() -> Result<()> {
        if env::var("INGESTOR_INTEGRATION_TEST").ok().as_deref() != Some("1") {
            return Ok(());
        }
        let database_url = match env::var("INGESTOR_TEST_DATABASE_URL") {
            Ok(value) => value,
            Err(_) => return Ok(()),
        };

        let table = format!("sensor_data_test_{}", std::process::id());
        let mut admin = sqlx::PgConnection::connect(&database_url).await?;
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                device text,
                temp double precision,
                tryk double precision,
                rpm bigint,
                timestamp timestamptz
            )"
        ))
        .execute(&mut admin)
        .await?;

        let mut store = SensorStore::new(database_url.clone(), table.clone());
        store.write("pump-1", &full_set()).await?;
        store
            .write(
                "pump-2",
                &MetricSet {
                    temperature: Some(19.5),
                    pressure: None,
                    rotational_speed: None,
                },
            )
            .await?;
        store.close().await;

        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&mut admin)
            .await?;
        assert_eq!(count, 2);

        let sparse: (Option<f64>, Option<f64>, Option<i64>) = sqlx::query_as(&format!(
            "SELECT temp, tryk, rpm FROM {table} WHERE device = 'pump-2'"
        ))
        .fetch_one(&mut admin)
        .await?;
        assert_eq!(sparse.0, Some(19.5));
        assert_eq!(sparse.1, None);
        assert_eq!(sparse.2, None);

        let stamped: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {table} WHERE timestamp IS NOT NULL"
        ))
        .fetch_one(&mut admin)
        .await?;
        assert_eq!(stamped, 2);

        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&mut admin)
            .await?;
        admin.close().await?;

        Ok(())
    }
}
