// External-side-effect collaborators used by the workflow engine.

pub mod execution_log;
pub mod notifications;
pub mod storage;

pub use execution_log::{
    ActionAttempt, ExecutionLogEntry, ExecutionLogError, ExecutionLogger, PgExecutionLogger,
};
pub use notifications::{
    NotificationJob, NotificationSink, NotifyError, PgNotificationQueue, SEND_NOTIFICATION_JOB,
};
pub use storage::{EntityStore, FieldUpdate, PgEntityStore, StorageError, StorageResult};
