//! The trait every Baton capability implements.
//!
//! A [`Capability`] is registered once, under its [`key`](Capability::key), in
//! the orchestrator's capability registry. Pipeline steps then refer to it by
//! that key and supply the options it runs with.

use crate::error::CapabilityError;
use crate::types::StepContext;
use serde_json::Value as JsonValue;

/// An opaque build operation invoked by pipeline steps.
///
/// **Purpose**: Capabilities do the actual work of a build (clean a directory,
/// copy assets, run a minifier). The orchestrator knows nothing about what they
/// do; it only sequences them and reports their failures.
///
/// **Threading**: Steps run strictly one after another, but the registry is
/// shared behind an `Arc`, so implementations must be `Send + Sync`.
///
/// # Example
///
/// ```rust
/// use baton_capability_protocol::{Capability, CapabilityError, StepContext};
/// use serde_json::{json, Value};
///
/// pub struct Announce;
///
/// impl Capability for Announce {
///     fn key(&self) -> &str {
///         "announce"
///     }
///
///     fn name(&self) -> &str {
///         "Announce"
///     }
///
///     fn configuration_options(&self) -> Option<Value> {
///         Some(json!({
///             "type": "object",
///             "properties": {
///                 "message": { "type": "string", "description": "Text to print" }
///             },
///             "required": ["message"]
///         }))
///     }
///
///     fn execute(&self, context: &StepContext) -> Result<(), CapabilityError> {
///         println!("{}", context.require_str("message")?);
///         Ok(())
///     }
/// }
/// ```
pub trait Capability: Send + Sync {
    /// Unique identifier used by steps to reference this capability.
    ///
    /// **Requirements**:
    /// - Must be unique within a registry
    /// - No whitespace and no `:` (the colon separates step targets, as in `clean:dist`)
    /// - Use kebab-case: `"exec"`, `"copy"`, `"inline-css"`
    fn key(&self) -> &str;

    /// Human-readable name shown in `baton capabilities`.
    fn name(&self) -> &str;

    /// One-line summary of what the capability does.
    fn description(&self) -> &str {
        ""
    }

    /// JSON Schema describing the options this capability accepts.
    ///
    /// Used for documentation output only; capabilities still validate their
    /// options in [`execute`](Capability::execute) and report
    /// [`CapabilityError::MissingOption`] or [`CapabilityError::InvalidOption`].
    fn configuration_options(&self) -> Option<JsonValue> {
        None
    }

    /// Perform the work for one step.
    ///
    /// `context.options` already contains the capability defaults, the step's
    /// own config and any command-line overrides, merged in that order.
    fn execute(&self, context: &StepContext) -> Result<(), CapabilityError>;
}
