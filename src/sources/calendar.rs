use super::{suppress, CrmApi};
use crate::models::{CrmUser, EventDto, RawRecord};
use chrono::{DateTime, NaiveDate, Utc};

/// Calendar events starting between today and `today + window_days`.
pub async fn fetch_upcoming_events(
    api: &dyn CrmApi,
    user: &CrmUser,
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<RawRecord> {
    let today = now.date_naive();
    suppress("calendar", api.list_calendar_events(user).await)
        .into_iter()
        .filter(|event| starts_soon(event, today, window_days))
        .map(RawRecord::Event)
        .collect()
}

fn starts_soon(event: &EventDto, today: NaiveDate, window_days: i64) -> bool {
    let days_out = event
        .start_time
        .date_naive()
        .signed_duration_since(today)
        .num_days();
    (0..=window_days).contains(&days_out)
}

#[cfg(test)]
mod tests {
    use super::starts_soon;
    use crate::models::EventDto;
    use chrono::{Duration, Utc};

    fn event(starts_in_days: i64) -> EventDto {
        EventDto {
            id: 9,
            summary: "Quarterly review".to_string(),
            start_time: Utc::now() + Duration::days(starts_in_days),
        }
    }

    #[test]
    fn keeps_events_inside_the_window() {
        let today = Utc::now().date_naive();
        assert!(starts_soon(&event(0), today, 7));
        assert!(starts_soon(&event(7), today, 7));
    }

    #[test]
    fn drops_past_and_far_future_events() {
        let today = Utc::now().date_naive();
        assert!(!starts_soon(&event(-1), today, 7));
        assert!(!starts_soon(&event(8), today, 7));
    }
}
