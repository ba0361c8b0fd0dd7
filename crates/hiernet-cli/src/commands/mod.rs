//! Commands - CLI Command Implementations
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

pub mod convert;
pub mod init;
pub mod list;
pub mod run;
pub mod summary;
pub mod utils;
