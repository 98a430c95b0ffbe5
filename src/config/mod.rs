//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientSettings
//!     → RestClient::from_settings (ClientConfig + HttpTransport)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Default headers stay mutable on the client after loading

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ClientSettings, HeaderValues, ObservabilityConfig, TimeoutConfig, TransportConfig};
pub use validation::{validate_config, ValidationError};
