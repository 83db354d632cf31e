//! Application layer: schema loading and binding
//!
//! This layer turns declarative schema files into command trees through the
//! domain's builder API.

pub mod binder;
pub mod error;
pub mod error_ext;
pub mod schema;

pub use binder::{bind_schema, BoundArgument, BoundSchema};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use schema::{ArgumentKind, ArgumentSchema, CommandSchema, ElementKind, GroupSchema, Schema};
