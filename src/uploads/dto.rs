use serde::{Deserialize, Serialize};

use crate::uploads::repo::UploadManifest;

pub const MAX_TOTAL_CHUNKS: i32 = 10_000;

#[derive(Debug, Deserialize)]
pub struct CreateUploadRequest {
    pub total_chunks: i32,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadStatus {
    #[serde(flatten)]
    pub manifest: UploadManifest,
    pub received: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct ChunkAck {
    pub chunk_index: i32,
    pub received: i64,
    pub total_chunks: i32,
}

pub fn validate_total_chunks(total: i32) -> Result<(), String> {
    if total < 1 {
        return Err("total_chunks must be at least 1".into());
    }
    if total > MAX_TOTAL_CHUNKS {
        return Err(format!("total_chunks must be at most {MAX_TOTAL_CHUNKS}"));
    }
    Ok(())
}

pub fn validate_chunk_index(index: i32, total: i32) -> Result<(), String> {
    if index < 0 || index >= total {
        return Err(format!("chunk index {index} out of range 0..{total}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_chunks_bounds() {
        assert!(validate_total_chunks(1).is_ok());
        assert!(validate_total_chunks(MAX_TOTAL_CHUNKS).is_ok());
        assert!(validate_total_chunks(0).is_err());
        assert!(validate_total_chunks(-5).is_err());
        assert!(validate_total_chunks(MAX_TOTAL_CHUNKS + 1).is_err());
    }

    #[test]
    fn chunk_index_must_be_in_range() {
        assert!(validate_chunk_index(0, 3).is_ok());
        assert!(validate_chunk_index(2, 3).is_ok());
        assert!(validate_chunk_index(3, 3).is_err());
        assert!(validate_chunk_index(-1, 3).is_err());
    }
}
