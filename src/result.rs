use crate::error::Error as ExportErr;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ExportErr>;
