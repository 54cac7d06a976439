use super::{CrmApi, SourceError};
use crate::models::{CrmUser, RawRecord};

/// Wraps the stale-companies statistic into at most one raw record. A count of
/// zero means no alert at all, not an alert saying "0".
pub async fn fetch_inactivity_alert(api: &dyn CrmApi, user: &CrmUser) -> Vec<RawRecord> {
    match api.stale_company_count(user).await {
        Ok(0) => Vec::new(),
        Ok(count) => vec![RawRecord::Inactivity {
            stale_companies: count,
        }],
        Err(SourceError::Unauthenticated) => Vec::new(),
        Err(error) => {
            tracing::warn!(source = "inactivity", error = %error, "source fetch failed, contributing no records this cycle");
            Vec::new()
        }
    }
}
