//! Analytics events for user-facing actions (login attempts and the like).
//!
//! Events are counted in a Prometheus registry by category and action.

mod recorder;

pub use recorder::{Analytics, AnalyticsRecorder, LOGIN_CATEGORY};
