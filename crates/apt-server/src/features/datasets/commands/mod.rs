pub mod delete;
pub mod publish;

pub use delete::{DeleteDatasetCommand, DeleteDatasetError, DeleteDatasetResponse};
pub use publish::{PublishDatasetCommand, PublishDatasetError, PublishDatasetResponse};
