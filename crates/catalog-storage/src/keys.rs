//! Shared key generation for media assets.
//!
//! Key format: `{aggregate_id}-{slot}.{extension}`, slot lowercased and the
//! extension stripped of any leading dot.

use uuid::Uuid;

/// Generate the storage key for one media slot of an aggregate.
pub fn storage_key(aggregate_id: Uuid, slot: &str, extension: &str) -> String {
    let slot = slot.to_lowercase();
    let extension = extension.trim().trim_start_matches('.').to_lowercase();
    if extension.is_empty() {
        format!("{}-{}", aggregate_id, slot)
    } else {
        format!("{}-{}.{}", aggregate_id, slot, extension)
    }
}
