//! Global gateway state: the action vocabulary, the reducer that owns the
//! auth state machine, the store that dispatches through middleware, and
//! the async intents that wrap provider calls.

pub mod actions;
pub mod intents;
pub mod reducer;
pub mod store;

pub use reducer::{AuthState, AuthStatus, GatewayState};
pub use store::{GatewayStore, Middleware};
