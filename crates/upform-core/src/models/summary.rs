use chrono::{DateTime, Utc};
use serde::Serialize;

use super::upload::UploadId;

/// Human-readable report of a committed upload, shown once after the redirect
#[derive(Debug, Clone, Serialize)]
pub struct UploadSummary {
    pub upload_id: UploadId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub file_name: String,
    /// Primary file size in MB, two decimals
    pub file_size_mb: String,
    pub image_name: String,
    /// Image size in KB, two decimals
    pub image_size_kb: String,
    pub created_at: DateTime<Utc>,
}

pub fn format_megabytes(bytes: Option<u64>) -> String {
    match bytes {
        Some(b) => format!("{:.2}", b as f64 / (1024.0 * 1024.0)),
        None => "0".to_string(),
    }
}

pub fn format_kilobytes(bytes: Option<u64>) -> String {
    match bytes {
        Some(b) => format!("{:.2}", b as f64 / 1024.0),
        None => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_use_two_decimals() {
        assert_eq!(format_megabytes(Some(5 * 1024 * 1024 + 512 * 1024)), "5.50");
        assert_eq!(format_kilobytes(Some(1536)), "1.50");
        assert_eq!(format_kilobytes(None), "0");
    }
}
