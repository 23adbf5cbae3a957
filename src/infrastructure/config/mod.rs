//! Infrastructure configuration modules.

pub mod host;
pub mod logging;
pub mod settings;

pub use host::HostConfig;
pub use logging::LoggingConfig;
pub use settings::Config;
