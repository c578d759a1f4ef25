//! Built-in capabilities
//!
//! These cover the non-transforming parts of a typical static-site build:
//! spawning external tools, cleaning output directories and copying assets.
//! Minifiers, inliners and dev servers are external programs run through
//! [`ExecCapability`].

pub mod clean;
pub mod copy;
pub mod exec;

pub use clean::CleanCapability;
pub use copy::CopyCapability;
pub use exec::ExecCapability;
