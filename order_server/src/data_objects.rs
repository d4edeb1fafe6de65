use chrono::{DateTime, Utc};
use order_engine::{db_types::OrderStatusType, order_objects::OrderQueryFilter};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

/// Query parameters accepted by the order search endpoint.
///
/// `status` is a comma-separated list of statuses, e.g. `?status=Shipped,Delivered`. Timestamps are RFC 3339.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchParams {
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
}

impl SearchParams {
    pub fn into_filter(self) -> Result<OrderQueryFilter, ServerError> {
        let mut filter = OrderQueryFilter::default();
        if let Some(user_id) = self.user_id.filter(|s| !s.trim().is_empty()) {
            filter = filter.with_user_id(user_id.trim());
        }
        if let Some(statuses) = self.status {
            for status in statuses.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                let status = status.parse::<OrderStatusType>().map_err(|e| ServerError::InvalidQuery(e.to_string()))?;
                filter = filter.with_status(status);
            }
        }
        if let Some(since) = self.since {
            filter = filter.since(parse_timestamp("since", &since)?)?;
        }
        if let Some(until) = self.until {
            filter = filter.until(parse_timestamp("until", &until)?)?;
        }
        Ok(filter)
    }
}

fn parse_timestamp(name: &str, value: &str) -> Result<DateTime<Utc>, ServerError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ServerError::InvalidQuery(format!("{name} must be an RFC 3339 timestamp. {e}")))
}
