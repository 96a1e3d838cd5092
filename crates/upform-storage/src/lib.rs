//! Upform Storage Library
//!
//! Scratch storage for uploads in flight and promotion into final storage.
//!
//! # Layout
//!
//! Every upload owns `scratch_root/{upload_id}`. Files are written there while the
//! request body is read and moved out only when the whole upload commits:
//!
//! - **Named files**: `scratch_root/{upload_id}/files/{name}` → `final_root/Files/{upload_id}/{name}`
//! - **Identified files**: `scratch_root/{upload_id}/images/{upload_id}` → `final_root/Images/Files/{upload_id}`
//!
//! The scratch directory is removed on every exit path, including when the session
//! is dropped mid-upload.

pub mod error;
pub mod layout;
pub mod promote;
pub mod scratch;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use layout::StorageLayout;
pub use scratch::{ScratchSession, ScratchStorage};
