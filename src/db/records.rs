use log::debug;

use super::AppState;
use crate::store::{Filter, Record, StoreError};

/// Ids per OR-filter when looking up related records.
pub const FILTER_CHUNK_SIZE: usize = 200;

impl AppState {
    /// Every record of `collection` whose `field` equals one of `values`.
    ///
    /// Values are queried in chunks of [`FILTER_CHUNK_SIZE`], one chunk after
    /// another; the first failing chunk aborts the lookup.
    pub async fn fetch_records_by_field(
        &self,
        collection: &str,
        field: &str,
        values: &[String],
    ) -> Result<Vec<Record>, StoreError> {
        let mut result = Vec::new();

        for chunk in values.chunks(FILTER_CHUNK_SIZE) {
            let Some(filter) = Filter::any_of(field, chunk) else {
                continue;
            };
            // Ids match at most one record each; other fields can fan out.
            let limit = if field == "id" { chunk.len() } else { usize::MAX };
            debug!(
                "Fetching {} by {} ({} values)",
                collection,
                field,
                chunk.len()
            );
            let records = self
                .store
                .find_records(collection, Some(&filter), "", limit)
                .await?;
            result.extend(records);
        }

        Ok(result)
    }

    pub async fn fetch_records_by_ids(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Record>, StoreError> {
        self.fetch_records_by_field(collection, "id", ids).await
    }
}
