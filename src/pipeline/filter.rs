// src/pipeline/filter.rs

//! Bulk condition filtering.

use crate::error::Result;
use crate::models::Listing;
use crate::storage::ListingStore;
use crate::utils::log;

/// Ids of listings not yet flagged whose condition is not new/unused.
pub fn non_new_ids(listings: &[Listing]) -> Vec<String> {
    listings
        .iter()
        .filter(|l| !l.is_filtered && !l.is_new())
        .map(|l| l.id.clone())
        .collect()
}

/// Flag every non-new listing as filtered. Returns the flagged ids.
///
/// Flagged listings also put their sellers on the implicit blocklist for
/// later classification runs.
pub async fn run_filter_non_new(store: &dyn ListingStore) -> Result<Vec<String>> {
    log::header("Filtering non-new listings");

    let listings = store.load_listings().await?;
    let ids = non_new_ids(&listings);
    if ids.is_empty() {
        log::info("No listings to filter");
        return Ok(ids);
    }

    let changed = store.mark_filtered(&ids).await?;
    log::success(&format!(
        "Flagged {} of {} listing(s) as filtered",
        changed,
        listings.len()
    ));
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    fn listing(id: &str, condition: Option<&str>, is_filtered: bool) -> Listing {
        Listing {
            id: id.to_string(),
            condition: condition.map(str::to_string),
            is_filtered,
            ..Listing::default()
        }
    }

    #[test]
    fn selects_unflagged_non_new() {
        let listings = vec![
            listing("new", Some("新品、未使用"), false),
            listing("used", Some("傷や汚れあり"), false),
            listing("unknown", None, false),
            listing("already", Some("傷や汚れあり"), true),
        ];
        assert_eq!(non_new_ids(&listings), vec!["used", "unknown"]);
    }

    #[tokio::test]
    async fn flags_in_store() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStorage::new(tmp.path());
        store
            .save_listings(&[
                listing("new", Some("新品、未使用"), false),
                listing("used", Some("未使用に近い"), false),
            ])
            .await
            .unwrap();

        let ids = run_filter_non_new(&store).await.unwrap();
        assert_eq!(ids, vec!["used"]);

        let stored = store.load_listings().await.unwrap();
        assert!(!stored[0].is_filtered);
        assert!(stored[1].is_filtered);

        assert!(run_filter_non_new(&store).await.unwrap().is_empty());
    }
}
