//! GBIF registry URL builders

use apt_common::types::RegistryKey;

/// Build the publisher's published datasets listing URL
pub fn published_datasets_url(base_url: &str, publisher_key: &str, offset: u64, limit: u64) -> String {
    format!(
        "{}/v1/organization/{}/publishedDataset?offset={}&limit={}",
        base_url, publisher_key, offset, limit
    )
}

/// Build the deleted datasets listing URL
pub fn deleted_datasets_url(base_url: &str, offset: u64, limit: u64) -> String {
    format!("{}/v1/dataset/deleted?offset={}&limit={}", base_url, offset, limit)
}

/// Build the dataset creation URL
pub fn datasets_url(base_url: &str) -> String {
    format!("{}/v1/dataset", base_url)
}

/// Build a dataset record URL (read, update, delete)
pub fn dataset_url(base_url: &str, key: &RegistryKey) -> String {
    format!("{}/v1/dataset/{}", base_url, key)
}

pub fn dataset_endpoint_url(base_url: &str, key: &RegistryKey) -> String {
    format!("{}/v1/dataset/{}/endpoint", base_url, key)
}

pub fn dataset_crawl_url(base_url: &str, key: &RegistryKey) -> String {
    format!("{}/v1/dataset/{}/crawl", base_url, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://api.gbif-uat.org";

    #[test]
    fn test_listing_urls() {
        assert_eq!(
            published_datasets_url(BASE, "pub-1", 2000, 1000),
            "https://api.gbif-uat.org/v1/organization/pub-1/publishedDataset?offset=2000&limit=1000"
        );
        assert_eq!(
            deleted_datasets_url(BASE, 0, 1000),
            "https://api.gbif-uat.org/v1/dataset/deleted?offset=0&limit=1000"
        );
    }

    #[test]
    fn test_dataset_urls() {
        let key = RegistryKey::new("k1");
        assert_eq!(datasets_url(BASE), "https://api.gbif-uat.org/v1/dataset");
        assert_eq!(dataset_url(BASE, &key), "https://api.gbif-uat.org/v1/dataset/k1");
        assert_eq!(
            dataset_endpoint_url(BASE, &key),
            "https://api.gbif-uat.org/v1/dataset/k1/endpoint"
        );
        assert_eq!(
            dataset_crawl_url(BASE, &key),
            "https://api.gbif-uat.org/v1/dataset/k1/crawl"
        );
    }
}
