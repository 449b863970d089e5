use serde::Serialize;

#[derive(Serialize, Debug, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: &'static str,
    /// Whether the upload directory exists.
    pub upload_dir_exists: bool,
    /// Number of blobs in the store.
    pub file_count: u64,
    /// Total size of all blobs, in bytes.
    pub total_bytes: u64,
    pub product_count: u64,
}
