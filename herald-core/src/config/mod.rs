//! Configuration loading.
//!
//! Configuration files may be YAML, TOML or JSON; the format is picked from
//! the file extension. After parsing, [`ConfigLoader::load`] applies
//! environment overrides through [`Configurable`] and checks the result with
//! [`Validatable`].
//!
//! ```rust,ignore
//! use herald_core::config::ConfigLoader;
//!
//! let config: ServerConfig = ConfigLoader::new()
//!     .with_env_prefix("HERALD")
//!     .load("herald.yaml")?;
//! ```

mod loader;
mod traits;

pub use loader::{ConfigFormat, ConfigLoader};
pub use traits::{Configurable, Validatable};
