pub mod service;

pub use service::AnalysisService;
