pub mod activities;
pub mod calendar;
pub mod inactivity;
pub mod records;
pub mod tasks;

use crate::models::{
    ActivityDto, CompanyDto, ContactDto, CrmUser, DealDto, EngineSettings, EventDto, RawRecord,
    TaskDto,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The collaborator rejected the call as unauthenticated. Treated as an
    /// expected empty result, not a failure.
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Read-only boundary to the CRM backend. Every query is scoped to the active
/// user and may fail independently of the others.
#[async_trait]
pub trait CrmApi: Send + Sync {
    async fn list_tasks(&self, user: &CrmUser) -> SourceResult<Vec<TaskDto>>;
    async fn list_calendar_events(&self, user: &CrmUser) -> SourceResult<Vec<EventDto>>;
    async fn list_contacts(&self, user: &CrmUser) -> SourceResult<Vec<ContactDto>>;
    async fn list_companies(&self, user: &CrmUser) -> SourceResult<Vec<CompanyDto>>;
    async fn list_deals(&self, user: &CrmUser) -> SourceResult<Vec<DealDto>>;
    async fn list_activities(&self, user: &CrmUser) -> SourceResult<Vec<ActivityDto>>;
    async fn stale_company_count(&self, user: &CrmUser) -> SourceResult<u64>;
}

/// Fan out to all seven sources and wait for every one to settle. A failed
/// source contributes zero records; it never aborts the cycle.
pub async fn collect_raw_records(
    api: &dyn CrmApi,
    user: &CrmUser,
    now: DateTime<Utc>,
    settings: &EngineSettings,
) -> Vec<RawRecord> {
    let (tasks, events, contacts, companies, deals, activities, inactivity) = tokio::join!(
        tasks::fetch_due_tasks(api, user, now, settings.upcoming_window_days),
        calendar::fetch_upcoming_events(api, user, now, settings.upcoming_window_days),
        records::fetch_recent_contacts(api, user, now, settings.recent_window_hours),
        records::fetch_recent_companies(api, user, now, settings.recent_window_hours),
        records::fetch_recent_deals(api, user, now, settings.recent_window_hours),
        activities::fetch_recent_activities(api, user, now, settings.recent_window_hours),
        inactivity::fetch_inactivity_alert(api, user),
    );

    let mut raw = Vec::new();
    raw.extend(tasks);
    raw.extend(events);
    raw.extend(contacts);
    raw.extend(companies);
    raw.extend(deals);
    raw.extend(activities);
    raw.extend(inactivity);
    raw
}

pub(crate) fn suppress<T>(source: &'static str, result: SourceResult<Vec<T>>) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(SourceError::Unauthenticated) => Vec::new(),
        Err(error) => {
            tracing::warn!(source, error = %error, "source fetch failed, contributing no records this cycle");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{suppress, SourceError};

    #[test]
    fn suppress_passes_successful_results_through() {
        let items = suppress("tasks", Ok(vec![1, 2, 3]));
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn suppress_turns_failures_into_empty_results() {
        let unauthenticated: Vec<i32> =
            suppress("tasks", Err(SourceError::Unauthenticated));
        assert!(unauthenticated.is_empty());

        let unavailable: Vec<i32> = suppress(
            "tasks",
            Err(SourceError::Unavailable("connection refused".to_string())),
        );
        assert!(unavailable.is_empty());
    }
}
