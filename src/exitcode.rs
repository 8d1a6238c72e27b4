//! Exit codes (BSD sysexits.h compatible, plus a check-failed status)

/// Successful termination; analyzed trees are fully well-formed
pub const OK: i32 = 0;

/// Analysis succeeded but found ill-formed nodes or branches
pub const ILL_FORMED: i32 = 1;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error
pub const DATAERR: i32 = 65;

/// Cannot open input
pub const NOINPUT: i32 = 66;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
