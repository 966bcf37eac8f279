//! Command implementations for the nnm binary.

pub mod redact;
