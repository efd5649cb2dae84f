pub mod oss;

pub use oss::{ObjectStorage, OssClient, OssOptions, PutObjectResult};
