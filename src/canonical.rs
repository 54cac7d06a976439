use crate::models::{
    ActivityDto, ActivityKind, CompanyDto, ContactDto, DealDto, EventDto, Notification,
    NotificationKind, RawRecord, TaskDto, INACTIVITY_ALERT_ID,
};
use chrono::{DateTime, Utc};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Today,
    Tomorrow,
    ThisWeek,
}

/// Date-only distance between the record's date and today. Time of day is
/// deliberately ignored: a task due at 23:59 is still "due today".
pub fn classify_urgency(target: DateTime<Utc>, now: DateTime<Utc>) -> Urgency {
    let days_out = target
        .date_naive()
        .signed_duration_since(now.date_naive())
        .num_days();
    match days_out {
        0 => Urgency::Today,
        1 => Urgency::Tomorrow,
        _ => Urgency::ThisWeek,
    }
}

/// Maps a raw source record to its canonical feed shape. Deterministic for a
/// given input except for `message`, which may vary with the current date
/// through the urgency classification, and is recomputed every cycle.
pub fn canonicalize(raw: RawRecord, now: DateTime<Utc>) -> Notification {
    match raw {
        RawRecord::Task(task) => canonicalize_task(task, now),
        RawRecord::Event(event) => canonicalize_event(event, now),
        RawRecord::Contact(contact) => canonicalize_contact(contact),
        RawRecord::Company(company) => canonicalize_company(company),
        RawRecord::Deal(deal) => canonicalize_deal(deal),
        RawRecord::Activity(activity) => canonicalize_activity(activity),
        RawRecord::Inactivity { stale_companies } => {
            canonicalize_inactivity(stale_companies, now)
        }
    }
}

fn canonicalize_task(task: TaskDto, now: DateTime<Utc>) -> Notification {
    let due = task.due_date.unwrap_or(now);
    let message = match classify_urgency(due, now) {
        Urgency::Today => "This task is due today.",
        Urgency::Tomorrow => "This task is due tomorrow.",
        Urgency::ThisWeek => "This task is due this week.",
    };
    Notification {
        id: format!("task-{}", task.id),
        kind: NotificationKind::Task,
        title: task.title,
        message: message.to_string(),
        read: false,
        archived: false,
        created_at: due,
        action_url: Some(format!("/tasks/{}", task.id)),
        action_label: Some("View task".to_string()),
        metadata: Some(json!({ "taskId": task.id })),
    }
}

fn canonicalize_event(event: EventDto, now: DateTime<Utc>) -> Notification {
    let message = match classify_urgency(event.start_time, now) {
        Urgency::Today => "This meeting takes place today.",
        Urgency::Tomorrow => "This meeting takes place tomorrow.",
        Urgency::ThisWeek => "This meeting is coming up this week.",
    };
    Notification {
        id: format!("event-{}", event.id),
        kind: NotificationKind::Event,
        title: event.summary,
        message: message.to_string(),
        read: false,
        archived: false,
        created_at: event.start_time,
        action_url: Some("/calendar".to_string()),
        action_label: Some("Open calendar".to_string()),
        metadata: Some(json!({ "eventId": event.id })),
    }
}

fn canonicalize_contact(contact: ContactDto) -> Notification {
    Notification {
        id: format!("contact-{}", contact.id),
        kind: NotificationKind::Contact,
        title: contact.name,
        message: "New contact added to your CRM.".to_string(),
        read: false,
        archived: false,
        created_at: contact.created_at,
        action_url: Some(format!("/contacts/{}", contact.id)),
        action_label: Some("View contact".to_string()),
        metadata: Some(json!({ "contactId": contact.id, "email": contact.email })),
    }
}

fn canonicalize_company(company: CompanyDto) -> Notification {
    Notification {
        id: format!("company-{}", company.id),
        kind: NotificationKind::Company,
        title: company.name,
        message: "New company added to your CRM.".to_string(),
        read: false,
        archived: false,
        created_at: company.created_at,
        action_url: Some(format!("/companies/{}", company.id)),
        action_label: Some("View company".to_string()),
        metadata: Some(json!({ "companyId": company.id })),
    }
}

fn canonicalize_deal(deal: DealDto) -> Notification {
    Notification {
        id: format!("deal-{}", deal.id),
        kind: NotificationKind::Deal,
        title: deal.name,
        message: "New deal created in your pipeline.".to_string(),
        read: false,
        archived: false,
        created_at: deal.created_at,
        action_url: Some(format!("/deals/{}", deal.id)),
        action_label: Some("View deal".to_string()),
        metadata: Some(json!({ "dealId": deal.id })),
    }
}

fn canonicalize_activity(activity: ActivityDto) -> Notification {
    let message = match activity.kind {
        ActivityKind::Call => "A call was logged.",
        ActivityKind::Email => "An email was logged.",
        ActivityKind::Note => "A note was added.",
        ActivityKind::Meeting => "An activity was logged.",
    };
    let action_url = activity
        .contact_id
        .map(|id| format!("/contacts/{id}"))
        .or_else(|| activity.company_id.map(|id| format!("/companies/{id}")))
        .or_else(|| activity.deal_id.map(|id| format!("/deals/{id}")));
    let action_label = action_url.as_ref().map(|_| "View record".to_string());
    Notification {
        id: format!("activity-{}", activity.id),
        kind: NotificationKind::Activity,
        title: activity.subject,
        message: message.to_string(),
        read: false,
        archived: false,
        created_at: activity.created_at,
        action_url,
        action_label,
        metadata: Some(json!({
            "activityId": activity.id,
            "activityKind": activity.kind.as_str(),
            "contactId": activity.contact_id,
            "companyId": activity.company_id,
            "dealId": activity.deal_id,
        })),
    }
}

fn canonicalize_inactivity(stale_companies: u64, now: DateTime<Utc>) -> Notification {
    Notification {
        id: INACTIVITY_ALERT_ID.to_string(),
        kind: NotificationKind::System,
        title: "Inactive companies".to_string(),
        message: format!(
            "{stale_companies} companies have had no recent activity. Consider reaching out."
        ),
        read: false,
        archived: false,
        created_at: now,
        action_url: Some("/companies?inactive=true".to_string()),
        action_label: Some("Review companies".to_string()),
        metadata: Some(json!({ "staleCompanies": stale_companies })),
    }
}
