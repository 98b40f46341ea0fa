// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod geometry;
pub mod path;
pub mod runtime;
pub mod sampler;
pub mod score;
pub mod session;
pub mod tracker;

pub use geometry::Point;
pub use sampler::Curve;
pub use session::{FinishReason, GameSession, SessionPhase};
