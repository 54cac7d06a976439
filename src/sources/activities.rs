use super::{suppress, CrmApi};
use crate::models::{ActivityDto, ActivityKind, CrmUser, RawRecord};
use chrono::{DateTime, Duration, Utc};

/// Calls, emails and notes logged within the last `window_hours`. Other
/// activity kinds (meetings) never surface in the feed.
pub async fn fetch_recent_activities(
    api: &dyn CrmApi,
    user: &CrmUser,
    now: DateTime<Utc>,
    window_hours: i64,
) -> Vec<RawRecord> {
    let threshold = now - Duration::hours(window_hours);
    suppress("activities", api.list_activities(user).await)
        .into_iter()
        .filter(|activity| is_feed_relevant(activity, threshold))
        .map(RawRecord::Activity)
        .collect()
}

fn is_feed_relevant(activity: &ActivityDto, threshold: DateTime<Utc>) -> bool {
    matches!(
        activity.kind,
        ActivityKind::Call | ActivityKind::Email | ActivityKind::Note
    ) && activity.created_at >= threshold
}
