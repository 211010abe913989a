//! Cadence CLI Library
//!
//! Terminal player built on the Cadence playback engine. Tracks come from the
//! track API or an offline JSON library; audio output is simulated.
//!
//! This library exposes the session pieces for testing purposes.

pub mod config;
pub mod device;
pub mod error;
pub mod library;
pub mod session;

// Re-export commonly used types for convenience
pub use config::CadenceConfig;
pub use device::SimulatedDevice;
pub use error::{CliError, Result};
pub use library::load_library;
pub use session::{render_status, Session, SessionCommand, TrackFeed};
