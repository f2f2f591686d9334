//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - every application rendered or validated
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Validation error - an application's sources break the multi-source rules
pub const VALIDATION_ERROR: i32 = 2;

/// Generation error - the manifest generator failed for a source
pub const GENERATION_ERROR: i32 = 3;

/// Dependency error - a chart dependency build failed under the `fail` policy
pub const DEPENDENCY_ERROR: i32 = 4;

/// IO error - file not found, permission denied, unreadable application file
pub const IO_ERROR: i32 = 5;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
