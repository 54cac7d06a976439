use super::{suppress, CrmApi};
use crate::models::{CrmUser, RawRecord, TaskDto, TaskStatus};
use chrono::{DateTime, NaiveDate, Utc};

/// Tasks assigned to the user, due between today and `today + window_days`,
/// excluding completed ones.
pub async fn fetch_due_tasks(
    api: &dyn CrmApi,
    user: &CrmUser,
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<RawRecord> {
    let today = now.date_naive();
    suppress("tasks", api.list_tasks(user).await)
        .into_iter()
        .filter(|task| is_due_soon(task, today, window_days))
        .map(RawRecord::Task)
        .collect()
}

fn is_due_soon(task: &TaskDto, today: NaiveDate, window_days: i64) -> bool {
    if task.status == TaskStatus::Completed {
        return false;
    }
    match task.due_date {
        Some(due) => {
            let days_out = due.date_naive().signed_duration_since(today).num_days();
            (0..=window_days).contains(&days_out)
        }
        None => false,
    }
}
