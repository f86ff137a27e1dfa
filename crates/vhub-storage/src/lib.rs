//! Durable object store for uploaded media.
//!
//! This crate provides:
//! - The `ObjectStore` contract: binary payload in, stable locator out
//! - An S3-compatible (Cloudflare R2) implementation
//! - An in-memory implementation for tests and local development

pub mod error;
pub mod memory;
pub mod r2;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryObjectStore;
pub use r2::{R2Config, R2MediaStore};
pub use store::{object_key, ObjectStore, StoredObject};
