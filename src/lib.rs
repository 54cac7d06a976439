pub mod canonical;
pub mod db;
pub mod engine;
pub mod errors;
pub mod feed;
pub mod models;
pub mod sources;
pub mod telemetry;

pub use db::Database;
pub use engine::{FeedSnapshot, NotificationCenter};
pub use errors::{EngineError, EngineResult};
pub use models::{
    ActivityCompleted, ActivityDto, ActivityKind, CompanyDto, ContactDto, CrmUser, DealDto,
    EngineSettings, EventDto, Notification, NotificationKind, RawRecord, TaskDto, TaskStatus,
    INACTIVITY_ALERT_ID,
};
pub use sources::{CrmApi, SourceError, SourceResult};
