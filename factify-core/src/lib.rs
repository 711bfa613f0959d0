pub mod config;
pub mod error;
pub mod payload;
pub mod session;
pub mod social;
pub mod types;

// Keep the public surface small and intentional.
pub use config::*;
pub use error::*;
pub use payload::*;
pub use session::*;
pub use social::*;
pub use types::*;
