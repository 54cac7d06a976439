use crate::models::Notification;
use std::collections::HashMap;

/// Orders a freshly canonicalized batch into feed order, newest first. The
/// sort is stable, so records sharing a timestamp keep their source order. No
/// de-duplication happens here; colliding ids collapse during reconciliation.
pub fn aggregate(mut records: Vec<Notification>) -> Vec<Notification> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records
}

/// Merges a fresh aggregation pass against the prior feed. Content always
/// comes from the fresh record; `read`/`archived` carry forward from the prior
/// record with the same id. Prior-only records are dropped, no tombstones.
/// Should two fresh records ever share an id, the later one in list order
/// wins.
///
/// The inactivity alert can never come back archived, whatever the prior feed
/// claims.
pub fn reconcile(fresh: Vec<Notification>, prior: &[Notification]) -> Vec<Notification> {
    let prior_flags: HashMap<&str, (bool, bool)> = prior
        .iter()
        .map(|record| (record.id.as_str(), (record.read, record.archived)))
        .collect();

    let mut merged: Vec<Notification> = Vec::with_capacity(fresh.len());
    let mut slot_by_id: HashMap<String, usize> = HashMap::with_capacity(fresh.len());
    for mut record in fresh {
        if let Some(&(read, archived)) = prior_flags.get(record.id.as_str()) {
            record.read = read;
            record.archived = archived;
        }
        if record.is_inactivity_alert() {
            record.archived = false;
        }
        match slot_by_id.get(record.id.as_str()) {
            Some(&slot) => merged[slot] = record,
            None => {
                slot_by_id.insert(record.id.clone(), merged.len());
                merged.push(record);
            }
        }
    }
    merged
}

/// Derived, never stored: records that are neither read nor archived.
pub fn unread_count(feed: &[Notification]) -> usize {
    feed.iter()
        .filter(|record| !record.read && !record.archived)
        .count()
}

/// Final safety net applied right before every persistence write, independent
/// of how the record got into memory.
pub fn enforce_inactivity_visible(feed: &mut [Notification]) {
    for record in feed {
        if record.is_inactivity_alert() {
            record.archived = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{aggregate, enforce_inactivity_visible, reconcile, unread_count};
    use crate::models::{Notification, NotificationKind, INACTIVITY_ALERT_ID};
    use chrono::{Duration, Utc};

    fn record(id: &str, hours_ago: i64) -> Notification {
        Notification {
            id: id.to_string(),
            kind: NotificationKind::Task,
            title: format!("title for {id}"),
            message: "message".to_string(),
            read: false,
            archived: false,
            created_at: Utc::now() - Duration::hours(hours_ago),
            action_url: None,
            action_label: None,
            metadata: None,
        }
    }

    #[test]
    fn aggregate_orders_newest_first() {
        let feed = aggregate(vec![record("a", 5), record("b", 1), record("c", 3)]);
        let ids: Vec<&str> = feed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn reconcile_preserves_flags_but_takes_fresh_content() {
        let mut prior = record("task-1", 2);
        prior.read = true;
        prior.title = "old title".to_string();

        let mut fresh = record("task-1", 2);
        fresh.title = "new title".to_string();

        let merged = reconcile(vec![fresh], &[prior]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].read);
        assert!(!merged[0].archived);
        assert_eq!(merged[0].title, "new title");
    }

    #[test]
    fn reconcile_drops_records_missing_from_the_fresh_pass() {
        let mut prior = record("task-2", 2);
        prior.read = true;

        let merged = reconcile(vec![record("task-3", 1)], &[prior]);
        assert!(merged.iter().all(|r| r.id != "task-2"));
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn reconcile_accepts_records_with_no_prior_entry_unchanged() {
        let merged = reconcile(vec![record("deal-9", 1)], &[]);
        assert!(!merged[0].read);
        assert!(!merged[0].archived);
    }

    #[test]
    fn reconcile_collapses_colliding_ids_to_the_last_occurrence() {
        let mut first = record("activity-5", 2);
        first.title = "first".to_string();
        let mut second = record("activity-5", 1);
        second.title = "second".to_string();

        let merged = reconcile(vec![first, second], &[]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "second");
    }

    #[test]
    fn inactivity_alert_never_comes_back_archived() {
        let mut prior = record(INACTIVITY_ALERT_ID, 1);
        prior.archived = true;
        prior.read = true;

        let merged = reconcile(vec![record(INACTIVITY_ALERT_ID, 0)], &[prior]);
        assert!(merged[0].read);
        assert!(!merged[0].archived);
    }

    #[test]
    fn unread_count_ignores_read_and_archived_records() {
        let mut read = record("a", 1);
        read.read = true;
        let mut archived = record("b", 2);
        archived.archived = true;
        let feed = vec![read, archived, record("c", 3)];
        assert_eq!(unread_count(&feed), 1);
    }

    #[test]
    fn enforce_inactivity_visible_clears_a_stored_archive_flag() {
        let mut alert = record(INACTIVITY_ALERT_ID, 0);
        alert.archived = true;
        let mut feed = vec![alert, record("task-1", 1)];
        enforce_inactivity_visible(&mut feed);
        assert!(!feed[0].archived);
    }
}
