//! CLI command implementations.

pub mod cat;
pub mod common;
pub mod init;
pub mod ls;
pub mod mount;
pub mod write;
