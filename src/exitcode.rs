//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination
pub const OK: i32 = 0;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error (malformed document or invalid tree operation)
pub const DATAERR: i32 = 65;

/// Cannot open input (unknown node id)
pub const NOINPUT: i32 = 66;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
