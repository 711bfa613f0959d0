pub mod account;
pub mod client;
pub mod dispatcher;
pub mod outcome;
pub mod poller;
pub mod social;
pub mod submitter;
pub mod testing;
pub mod traits;
pub mod transport;

pub use client::AnalysisClient;
pub use dispatcher::{Dispatch, ResultBoard, ResultSlots};
pub use outcome::AnalysisOutcome;
pub use social::SocialFeed;
