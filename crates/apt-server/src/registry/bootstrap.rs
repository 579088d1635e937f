//! Startup synchronization with the registry catalog
//!
//! Pages through the publisher's published datasets, then through all
//! deleted datasets, and keeps the records whose endpoints point at this
//! APT. Entries are inserted as they arrive, so readers may see a partial
//! view while bootstrap is running.

use super::client::RegistryClient;
use super::error::RegistryResult;
use super::state::{InsertOutcome, RegistryState};
use super::types::{DatasetRecord, Page};
use serde::Serialize;
use std::future::Future;

/// Page size requested from the registry listings.
pub const PAGE_SIZE: u64 = 1000;

/// Counters for one registry listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingReport {
    pub pages: u64,
    pub kept: u64,
    pub collisions: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub published: ListingReport,
    pub deleted: ListingReport,
}

impl BootstrapReport {
    pub fn collisions(&self) -> u64 {
        self.published.collisions + self.deleted.collisions
    }
}

/// Ownership filters applied to listing entries
pub struct Filter<'a> {
    pub public_url: &'a str,
    pub publisher_key: &'a str,
}

#[derive(Clone, Copy, Debug)]
enum Listing {
    Published,
    Deleted,
}

impl Listing {
    fn name(self) -> &'static str {
        match self {
            Listing::Published => "published",
            Listing::Deleted => "deleted",
        }
    }
}

/// Populate `state` from both registry listings
#[tracing::instrument(skip_all, fields(public_url = %filter.public_url))]
pub async fn run(
    client: &dyn RegistryClient,
    state: &RegistryState,
    filter: &Filter<'_>,
) -> RegistryResult<BootstrapReport> {
    tracing::info!("Initializing GBIF published datasets list");
    let published = sync_listing(Listing::Published, state, filter, |offset| {
        client.list_published_page(offset, PAGE_SIZE)
    })
    .await?;
    tracing::info!(count = published.kept, pages = published.pages, "GBIF published datasets found");

    tracing::info!("Initializing GBIF deleted datasets list");
    let deleted = sync_listing(Listing::Deleted, state, filter, |offset| {
        client.list_deleted_page(offset, PAGE_SIZE)
    })
    .await?;
    tracing::info!(count = deleted.kept, pages = deleted.pages, "GBIF deleted datasets found");

    Ok(BootstrapReport { published, deleted })
}

async fn sync_listing<F, Fut>(
    listing: Listing,
    state: &RegistryState,
    filter: &Filter<'_>,
    mut fetch: F,
) -> RegistryResult<ListingReport>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = RegistryResult<Page<DatasetRecord>>>,
{
    let mut report = ListingReport::default();
    let mut offset = 0;

    loop {
        let page = fetch(offset).await?;
        report.pages += 1;

        for record in &page.results {
            if !owns_record(listing, record, filter) {
                continue;
            }
            for endpoint in record.endpoint_ids() {
                if !endpoint.has_prefix(filter.public_url) {
                    continue;
                }
                let outcome = match listing {
                    Listing::Published => state.insert_published(endpoint.clone(), record.key.clone()),
                    Listing::Deleted => state.insert_deleted(endpoint.clone(), record.key.clone()),
                };
                match outcome {
                    InsertOutcome::Inserted => report.kept += 1,
                    InsertOutcome::Collision { existing } => {
                        report.collisions += 1;
                        tracing::warn!(
                            listing = listing.name(),
                            %endpoint,
                            ignored_key = %record.key,
                            ?existing,
                            "Endpoint already registered, keeping first mapping"
                        );
                    },
                }
            }
        }

        if page.end_of_records {
            break;
        }
        offset += PAGE_SIZE;
    }

    Ok(report)
}

fn owns_record(listing: Listing, record: &DatasetRecord, filter: &Filter<'_>) -> bool {
    match listing {
        Listing::Published => true,
        Listing::Deleted => record.publishing_organization_key.as_deref() == Some(filter.publisher_key),
    }
}
