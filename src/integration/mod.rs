//! Shell Integration
//!
//! Recovers command structure from the raw output stream by recognizing
//! the marker sequences a shell startup hook emits around every foreground
//! command. The hook itself is an external collaborator; this module only
//! parses what it emits.

pub mod markers;
pub mod parser;

pub use markers::Marker;
pub use parser::MarkerParser;
