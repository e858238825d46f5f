pub mod error;
pub mod openai;
pub mod suggestion;
pub mod telemetry;
