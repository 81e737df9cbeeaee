pub mod session;
pub mod settings;

pub use session::{SessionConfig, SessionLayer};
pub use settings::{AppConfig, ConfigError};
