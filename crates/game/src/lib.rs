//! Gameplay for Textroll: scoring, the session orchestrator and the
//! settings the runner loads.

pub mod autopilot;
pub mod config;
pub mod scoring;
pub mod session;

pub use autopilot::Autopilot;
pub use config::GameConfig;
pub use scoring::Scoring;
pub use session::{GameSession, RestartPolicy, SessionConfig, SessionState};
