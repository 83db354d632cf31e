//! Standard exit codes (BSD sysexits.h compatible)
//!
//! A failed parse exits with the OR of the failing commands' own error codes;
//! these codes are reserved for failures of the tool itself.

/// Successful termination
pub const OK: i32 = 0;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error (malformed schema or broken declaration)
pub const DATAERR: i32 = 65;

/// Cannot open input
pub const NOINPUT: i32 = 66;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
