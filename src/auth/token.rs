//! Token secrets and the records built around them.

pub mod record;
pub mod secret;
