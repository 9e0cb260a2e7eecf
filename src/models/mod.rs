pub mod action;
pub mod maintenance;
pub mod notification;
pub mod plugin;
pub mod user;

pub use action::Action;
pub use maintenance::ScheduledMaintenanceState;
pub use notification::{Notification, Severity};
pub use plugin::PluginRoute;
pub use user::User;
