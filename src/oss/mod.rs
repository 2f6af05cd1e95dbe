mod aws_s3_object_store;
mod error;
mod memory_object_store;
mod object_store;
mod object_store_types;

pub use aws_s3_object_store::{AwsS3ObjectStore, AwsS3ObjectStoreConfig};
pub use error::ObjectStoreError;
pub use memory_object_store::{compute_etag, MemoryObjectStore, MemoryObjectStoreConfig};
pub use object_store::ObjectStore;
pub use object_store_types::{
    trim_etag, CreateBucketOptions, GetFileOptions, ObjectInfo, ObjectMeta, PartInfo,
    PutFileOptions, PutStreamOptions, StoreOperation, MIN_PART_SIZE,
};
