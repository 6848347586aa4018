use super::verifier::ItemKind;
use crate::catalog::{CatalogItem, CatalogSearch};
use crate::server::metrics::{record_backfill, record_error};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Fetches up to `count` extra items for a mood and genre with a single
/// broad catalog search, skipping excluded ids.
///
/// Catalog failures produce an empty list.
pub async fn backfill<K: ItemKind>(
    catalog: &dyn CatalogSearch,
    mood: &str,
    genre: &str,
    count: usize,
    exclusions: &HashSet<String>,
    search_limit: usize,
) -> Vec<K::Candidate> {
    if count == 0 {
        return Vec::new();
    }

    let query = format!("{} {}", genre, mood);
    let candidates = match K::search(catalog, &query, search_limit).await {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(kind = K::LABEL, query = %query, error = %e, "Backfill search failed");
            record_error("catalog_unavailable", "backfill");
            return Vec::new();
        }
    };

    let items: Vec<K::Candidate> = candidates
        .into_iter()
        .filter(|c| !exclusions.contains(c.id()))
        .take(count)
        .collect();

    debug!(
        kind = K::LABEL,
        requested = count,
        found = items.len(),
        "Backfilled items"
    );
    record_backfill(K::LABEL, items.len());
    items
}
