use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The attributes of a client used for benchmarking and peer matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub client_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    /// Industry classification code (e.g. a NAICS code).
    pub industry_code: String,
    /// Trailing twelve-month revenue in the organization's reporting currency.
    pub annual_revenue: f64,
    pub region: String,
    pub business_model: String,
}
