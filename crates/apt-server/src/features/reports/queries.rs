use crate::registry::{EndpointId, Reconciler};
use apt_common::types::RegistryKey;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub url: EndpointId,
    pub key: RegistryKey,
}

fn entries(mappings: Vec<(EndpointId, RegistryKey)>) -> Vec<ReportEntry> {
    mappings
        .into_iter()
        .map(|(url, key)| ReportEntry { url, key })
        .collect()
}

pub fn registered(reconciler: &Reconciler) -> Vec<ReportEntry> {
    entries(reconciler.list_published())
}

pub fn deleted(reconciler: &Reconciler) -> Vec<ReportEntry> {
    entries(reconciler.list_deleted())
}
