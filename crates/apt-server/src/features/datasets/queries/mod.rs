pub mod download;
pub mod list;

pub use download::{DownloadDatasetError, DownloadDatasetQuery, DownloadDatasetResponse};
pub use list::{DatasetListItem, ListDatasetsError, ListDatasetsQuery, Registration};
