use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateGalleryRequest {
    pub title: String,
    #[serde(default)]
    pub client_email: Option<String>,
    /// Storage key of the cover asset, typically from a completed upload.
    #[serde(default)]
    pub cover_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}
