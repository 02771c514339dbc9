pub mod codec;
pub mod crypto;
pub mod error;
pub mod master;
pub mod policy;
pub mod record;
