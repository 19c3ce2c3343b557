//! Recurring Task Provider
//!
//! The outer surface of the recurring task engine:
//! - [`wire`]: records to and from the configuration API's JSON
//! - [`TaskClient`]: async seam to the REST endpoints
//! - [`RecurringTaskResource`]: create, adopt, read, update, delete and import
//! - [`ProviderConfig`]: TOML connection settings
//!
//! # Example
//!
//! ```rust,ignore
//! use rtask_provider::{ProviderConfig, RecurringTaskResource};
//!
//! # async fn example(client: impl rtask_provider::TaskClient) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProviderConfig::load("rtask.toml")?;
//! let resource = RecurringTaskResource::new(client, config.engine_config());
//!
//! let desired = rtask_record::TaskRecord::new("backup")?.with("backup_directory", "bak")?;
//! let state = resource.create("nightly-backup", &desired).await?;
//! println!("created {}", state.id);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod client;
pub mod config;
pub mod error;
pub mod input;
pub mod resource;
pub mod state;
pub mod wire;

pub use client::{ClientError, TaskClient};
pub use config::{ConfigError, ProviderConfig};
pub use error::ProviderError;
pub use resource::{RecurringTaskResource, UpdateOutcome};
pub use state::{ResourceState, StateError};
pub use wire::{create_payload, parse_response, patch_payload, ParsedResponse, WireError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
