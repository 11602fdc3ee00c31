use serde::{Deserialize, Serialize};

/// Claims carried by a record store auth token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreTokenClaims {
    pub id: String,
    #[serde(rename = "type")]
    pub token_type: String,
    #[serde(rename = "collectionId", default)]
    pub collection_id: String,
    pub exp: usize,
}
