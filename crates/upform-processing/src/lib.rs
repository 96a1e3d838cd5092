//! Upform Processing Library
//!
//! Streaming `multipart/form-data` handling: framing the body into sections,
//! parsing section headers, routing sections to file or text sinks and decoding
//! text fields.

pub mod accumulator;
pub mod charset;
pub mod multipart;
pub mod router;

// Re-export commonly used types
pub use accumulator::TextAccumulator;
pub use multipart::{
    boundary_from_content_type, MultipartStream, SectionDescriptor, SectionHeaders,
    MAX_BOUNDARY_LENGTH,
};
pub use router::{Route, SectionRouter};
