use super::{suppress, CrmApi};
use crate::models::{CrmUser, RawRecord};
use chrono::{DateTime, Duration, Utc};

/// Contacts created within the last `window_hours`.
pub async fn fetch_recent_contacts(
    api: &dyn CrmApi,
    user: &CrmUser,
    now: DateTime<Utc>,
    window_hours: i64,
) -> Vec<RawRecord> {
    let threshold = now - Duration::hours(window_hours);
    suppress("contacts", api.list_contacts(user).await)
        .into_iter()
        .filter(|contact| contact.created_at >= threshold)
        .map(RawRecord::Contact)
        .collect()
}

/// Companies created within the last `window_hours`.
pub async fn fetch_recent_companies(
    api: &dyn CrmApi,
    user: &CrmUser,
    now: DateTime<Utc>,
    window_hours: i64,
) -> Vec<RawRecord> {
    let threshold = now - Duration::hours(window_hours);
    suppress("companies", api.list_companies(user).await)
        .into_iter()
        .filter(|company| company.created_at >= threshold)
        .map(RawRecord::Company)
        .collect()
}

/// Deals created within the last `window_hours`.
pub async fn fetch_recent_deals(
    api: &dyn CrmApi,
    user: &CrmUser,
    now: DateTime<Utc>,
    window_hours: i64,
) -> Vec<RawRecord> {
    let threshold = now - Duration::hours(window_hours);
    suppress("deals", api.list_deals(user).await)
        .into_iter()
        .filter(|deal| deal.created_at >= threshold)
        .map(RawRecord::Deal)
        .collect()
}
