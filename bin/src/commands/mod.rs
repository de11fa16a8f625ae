//! CLI command implementations.

pub(crate) mod convert_all;
pub(crate) mod decode;
pub(crate) mod download;
pub(crate) mod dump;
