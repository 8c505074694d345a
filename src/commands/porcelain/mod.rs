//! Porcelain commands
//!
//! Each command exposes the core operation (returning data) next to the method the
//! CLI calls, which renders the result to the repository's writer.

pub mod add;
pub mod branch;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod log;
pub mod status;
