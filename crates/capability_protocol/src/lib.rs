//! # Baton Capability Protocol
//!
//! Types and traits shared between the Baton orchestrator and the capabilities
//! it invokes. A capability is the unit of real work behind a pipeline step:
//! removing a directory, copying files, or spawning an external minifier.
//!
//! Capabilities are registered statically at startup. The orchestrator hands
//! each one a [`StepContext`] carrying the merged options for the step being
//! executed, and expects a [`CapabilityError`] back on failure.
//!
//! ## Quick Start
//!
//! ```rust
//! use baton_capability_protocol::{Capability, CapabilityError, StepContext};
//!
//! pub struct Touch;
//!
//! impl Capability for Touch {
//!     fn key(&self) -> &str {
//!         "touch"
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Touch File"
//!     }
//!
//!     fn execute(&self, context: &StepContext) -> Result<(), CapabilityError> {
//!         let path = context.resolve_path(context.require_str("path")?);
//!         std::fs::write(path, b"")?;
//!         Ok(())
//!     }
//! }
//! ```

pub mod error;
pub mod traits;
pub mod types;

pub use error::CapabilityError;
pub use traits::Capability;
pub use types::{merge_options, value_as_string_list, CapabilityKey, StepContext, StepOptions};

// Re-export serde_json so capability crates agree on the option value type.
pub use serde_json;
