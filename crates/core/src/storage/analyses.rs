use crate::domain::record::{AnalysisOptions, AnalysisRecord, AnalysisSummary, AnalysisType};
use crate::storage::HistoryStore;
use anyhow::Context;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct PgHistoryStore {
    pool: sqlx::PgPool,
}

impl PgHistoryStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

type RecordRow = (
    uuid::Uuid,
    DateTime<Utc>,
    Option<uuid::Uuid>,
    String,
    serde_json::Value,
    serde_json::Value,
);

fn parse_type(raw: &str) -> anyhow::Result<AnalysisType> {
    AnalysisType::parse(raw).with_context(|| format!("unknown analysis_type in store: {raw}"))
}

fn record_from_row(row: RecordRow) -> anyhow::Result<AnalysisRecord> {
    let (id, analysis_datetime, user_id, analysis_type, options, data) = row;
    Ok(AnalysisRecord {
        id,
        analysis_datetime,
        user_id,
        analysis_type: parse_type(&analysis_type)?,
        options_selected: serde_json::from_value(options)
            .context("failed to decode options_selected")?,
        data: serde_json::from_value(data)
            .with_context(|| format!("failed to decode analysis data for {id}"))?,
    })
}

#[async_trait::async_trait]
impl HistoryStore for PgHistoryStore {
    async fn save(&self, record: &AnalysisRecord) -> anyhow::Result<()> {
        let options = serde_json::to_value(record.options_selected)
            .context("failed to encode options_selected")?;
        let data = serde_json::to_value(&record.data).context("failed to encode analysis data")?;

        sqlx::query(
            "INSERT INTO analyses (id, analysis_datetime, user_id, analysis_type, options_selected, data) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id)
        .bind(record.analysis_datetime)
        .bind(record.user_id)
        .bind(record.analysis_type.as_str())
        .bind(options)
        .bind(data)
        .execute(&self.pool)
        .await
        .context("insert analyses failed")?;

        Ok(())
    }

    async fn list(&self, user_id: uuid::Uuid) -> anyhow::Result<Vec<AnalysisSummary>> {
        let rows: Vec<(uuid::Uuid, DateTime<Utc>, String, serde_json::Value)> = sqlx::query_as(
            "SELECT id, analysis_datetime, analysis_type, options_selected \
             FROM analyses \
             WHERE user_id = $1 \
             ORDER BY analysis_datetime DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("select analyses failed")?;

        rows.into_iter()
            .map(|(id, analysis_datetime, analysis_type, options)| {
                Ok(AnalysisSummary {
                    id,
                    analysis_datetime,
                    analysis_type: parse_type(&analysis_type)?,
                    options_selected: serde_json::from_value::<AnalysisOptions>(options)
                        .context("failed to decode options_selected")?,
                })
            })
            .collect()
    }

    async fn get(&self, id: uuid::Uuid) -> anyhow::Result<Option<AnalysisRecord>> {
        let row: Option<RecordRow> = sqlx::query_as(
            "SELECT id, analysis_datetime, user_id, analysis_type, options_selected, data \
             FROM analyses \
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("select analysis failed")?;

        row.map(record_from_row).transpose()
    }

    async fn delete(&self, id: uuid::Uuid, user_id: uuid::Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM analyses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("delete analysis failed")?;
        Ok(res.rows_affected() > 0)
    }
}
