//! Object storage adapters: S3-compatible buckets and an in-memory store.

mod memory;
mod presign;
mod s3;

pub use memory::MemoryObjectStorage;
pub use presign::{AUTO_REGION, AddressingStyle, PresignMethod, Presigner, S3Credentials};
pub use s3::S3ObjectStorage;
