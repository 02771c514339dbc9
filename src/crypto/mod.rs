pub mod envelope;
pub mod kdf;
pub mod sensitive;
