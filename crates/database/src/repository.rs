use crate::DbError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{
    ClientProfile, CollaboratorError, DataPoint, FinancialHistorySource, Insight, InsightSink,
    InsightType, MetricSeries, TimeRange,
};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

/// A row of the `clients` table.
#[derive(Debug, Clone, FromRow)]
pub struct DbClient {
    pub client_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub industry_code: String,
    pub annual_revenue: Decimal,
    pub region: String,
    pub business_model: String,
}

impl From<DbClient> for ClientProfile {
    fn from(row: DbClient) -> Self {
        ClientProfile {
            client_id: row.client_id,
            organization_id: row.organization_id,
            name: row.name,
            industry_code: row.industry_code,
            annual_revenue: row.annual_revenue.to_f64().unwrap_or_default(),
            region: row.region,
            business_model: row.business_model,
        }
    }
}

/// A row of the `metric_observations` table.
#[derive(Debug, Clone, FromRow)]
pub struct DbObservation {
    pub metric: String,
    pub observed_at: DateTime<Utc>,
    pub value: Option<Decimal>,
}

fn to_decimal(field: &str, value: f64) -> Result<Decimal, DbError> {
    Decimal::from_f64(value)
        .ok_or_else(|| DbError::InvalidData(format!("{field} value {value} cannot be stored as NUMERIC")))
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_client(&self, client_id: Uuid) -> Result<Option<ClientProfile>, DbError> {
        let row = sqlx::query_as::<_, DbClient>(
            r#"
            SELECT client_id, organization_id, name, industry_code, annual_revenue, region, business_model
            FROM clients
            WHERE client_id = $1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ClientProfile::from))
    }

    pub async fn get_clients_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<ClientProfile>, DbError> {
        let rows = sqlx::query_as::<_, DbClient>(
            r#"
            SELECT client_id, organization_id, name, industry_code, annual_revenue, region, business_model
            FROM clients
            WHERE organization_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ClientProfile::from).collect())
    }

    /// Inserts a client or refreshes its attributes.
    pub async fn save_client(&self, client: &ClientProfile) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO clients (client_id, organization_id, name, industry_code, annual_revenue, region, business_model)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (client_id) DO UPDATE SET
                organization_id = EXCLUDED.organization_id,
                name = EXCLUDED.name,
                industry_code = EXCLUDED.industry_code,
                annual_revenue = EXCLUDED.annual_revenue,
                region = EXCLUDED.region,
                business_model = EXCLUDED.business_model
            "#,
        )
        .bind(client.client_id)
        .bind(client.organization_id)
        .bind(&client.name)
        .bind(&client.industry_code)
        .bind(to_decimal("annual_revenue", client.annual_revenue)?)
        .bind(&client.region)
        .bind(&client.business_model)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Stores every point of `series` in one transaction, replacing existing values
    /// for the same periods.
    pub async fn save_series(&self, series: &MetricSeries) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        for point in &series.points {
            let value = point.value.map(|v| to_decimal(&series.metric, v)).transpose()?;
            sqlx::query(
                r#"
                INSERT INTO metric_observations (client_id, metric, observed_at, value)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (client_id, metric, observed_at) DO UPDATE SET value = EXCLUDED.value
                "#,
            )
            .bind(series.client_id)
            .bind(&series.metric)
            .bind(point.timestamp)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Fetches the observations of several metrics, grouped into one series each.
    pub async fn get_metric_series(
        &self,
        client_id: Uuid,
        metrics: &[String],
        range: TimeRange,
    ) -> Result<Vec<MetricSeries>, DbError> {
        let rows = sqlx::query_as::<_, DbObservation>(
            r#"
            SELECT metric, observed_at, value
            FROM metric_observations
            WHERE client_id = $1 AND metric = ANY($2) AND observed_at >= $3 AND observed_at <= $4
            ORDER BY metric ASC, observed_at ASC
            "#,
        )
        .bind(client_id)
        .bind(metrics)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: BTreeMap<String, Vec<DataPoint>> = BTreeMap::new();
        for row in rows {
            let value = row.value.and_then(|d| d.to_f64());
            grouped
                .entry(row.metric)
                .or_default()
                .push(DataPoint::new(row.observed_at, value));
        }

        grouped
            .into_iter()
            .map(|(metric, points)| {
                MetricSeries::new(client_id, metric, points).map_err(|e| DbError::InvalidData(e.to_string()))
            })
            .collect()
    }

    /// Appends an insight. Existing rows are never touched.
    pub async fn save_insight(&self, insight: &Insight) -> Result<(), DbError> {
        let payload = serde_json::to_value(insight)?;
        sqlx::query(
            r#"
            INSERT INTO insights (insight_id, client_id, insight_type, impact, confidence, data, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(insight.id)
        .bind(insight.client_id)
        .bind(insight.insight_type.as_str())
        .bind(insight.impact.as_str())
        .bind(insight.confidence)
        .bind(&insight.data)
        .bind(payload)
        .bind(insight.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The most recent insights of a client, newest first.
    pub async fn get_insights_for_client(
        &self,
        client_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Insight>, DbError> {
        let payloads: Vec<serde_json::Value> = sqlx::query_scalar(
            r#"
            SELECT payload
            FROM insights
            WHERE client_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(client_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        payloads
            .into_iter()
            .map(|p| serde_json::from_value(p).map_err(DbError::from))
            .collect()
    }

    /// Overall scores of the latest risk insights, returned oldest first.
    pub async fn get_risk_history(&self, client_id: Uuid, limit: i64) -> Result<Vec<f64>, DbError> {
        let rows: Vec<Option<f64>> = sqlx::query_scalar(
            r#"
            SELECT (data->>'overall_score')::DOUBLE PRECISION
            FROM insights
            WHERE client_id = $1 AND insight_type = $2 AND data ? 'overall_score'
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(client_id)
        .bind(InsightType::Risk.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        let mut scores: Vec<f64> = rows.into_iter().flatten().collect();
        scores.reverse();
        Ok(scores)
    }
}

#[async_trait]
impl FinancialHistorySource for DbRepository {
    async fn fetch_financial_history(
        &self,
        client_id: Uuid,
        metric_names: &[String],
        range: TimeRange,
    ) -> Result<Vec<MetricSeries>, CollaboratorError> {
        Ok(self.get_metric_series(client_id, metric_names, range).await?)
    }

    async fn fetch_client(&self, client_id: Uuid) -> Result<Option<ClientProfile>, CollaboratorError> {
        Ok(self.get_client(client_id).await?)
    }

    async fn fetch_clients(&self, organization_id: Uuid) -> Result<Vec<ClientProfile>, CollaboratorError> {
        Ok(self.get_clients_for_organization(organization_id).await?)
    }

    async fn fetch_risk_history(&self, client_id: Uuid, limit: usize) -> Result<Vec<f64>, CollaboratorError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(self.get_risk_history(client_id, limit).await?)
    }
}

#[async_trait]
impl InsightSink for DbRepository {
    async fn persist_insight(&self, record: &Insight) -> Result<(), CollaboratorError> {
        Ok(self.save_insight(record).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_rows_convert_numeric_revenue() {
        let row = DbClient {
            client_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: "Acme".to_string(),
            industry_code: "5412".to_string(),
            annual_revenue: Decimal::new(125_000_050, 2),
            region: "west".to_string(),
            business_model: "services".to_string(),
        };
        let profile = ClientProfile::from(row);
        assert!((profile.annual_revenue - 1_250_000.5).abs() < 1e-6);
    }

    #[test]
    fn non_finite_values_cannot_be_stored() {
        assert!(to_decimal("revenue", f64::NAN).is_err());
        assert!(to_decimal("revenue", 12.5).is_ok());
    }

    #[test]
    fn db_errors_map_to_collaborator_errors() {
        assert!(matches!(CollaboratorError::from(DbError::NotFound), CollaboratorError::NotFound(_)));
        assert!(matches!(
            CollaboratorError::from(DbError::InvalidData("x".to_string())),
            CollaboratorError::InvalidData(_)
        ));
    }
}
