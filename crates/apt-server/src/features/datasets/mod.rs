//! Dataset archives: upload, download, listing and deletion

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    DeleteDatasetCommand, DeleteDatasetError, DeleteDatasetResponse, PublishDatasetCommand,
    PublishDatasetError, PublishDatasetResponse,
};

pub use queries::{
    DatasetListItem, DownloadDatasetError, DownloadDatasetQuery, ListDatasetsError,
    ListDatasetsQuery,
};

pub use routes::datasets_routes;
