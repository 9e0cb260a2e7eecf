use serde::{Deserialize, Serialize};

/// Whether a scheduled maintenance banner should be shown, and its text.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduledMaintenanceState {
    pub show: bool,
    pub message: String,
}
