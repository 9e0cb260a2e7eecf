pub mod base;
pub mod github_provider;
pub mod icat_provider;
pub mod jwt_provider;
pub mod loading_provider;
pub mod test_provider;

// Re-export from base.rs so we can do "use crate::providers::*;"
pub use base::*;
pub use loading_provider::LoadingAuthProvider;
pub use test_provider::TestAuthProvider;
