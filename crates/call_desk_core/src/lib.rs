pub mod domain;
pub mod notification;
pub mod optimistic;
pub mod ports;
pub mod stats;
pub mod view;
pub mod voice;

pub use domain::{
    Agent, AgentStatus, AuthSession, Call, CallOutcome, CallStatus, Document, Message,
    SenderRole, Task, TaskCategory, TaskFilter, TaskPatch,
};
pub use notification::{Notification, NotificationError, NotificationKind, RenderedEmail};
pub use optimistic::{Keyed, OptimisticList};
pub use ports::{CallProvider, DatabaseService, Mailer, OutboundEmail, PortError, PortResult};
pub use stats::DashboardStats;
pub use view::{query_calls, CallQuery, Page, TaskBoard};
pub use voice::{StatusUpdate, VoiceSession, VoiceStatus};
