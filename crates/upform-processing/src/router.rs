use upform_core::{FilePolicy, IngestError, SinkKind};

use crate::multipart::SectionDescriptor;

/// Where a section's body goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Stream into scratch storage under the given layout
    File(SinkKind),
    /// Buffer as a text form value
    Text,
}

/// Decides per section between file storage and the text accumulator.
#[derive(Debug, Clone)]
pub struct SectionRouter {
    policy: FilePolicy,
}

impl SectionRouter {
    pub fn new(policy: FilePolicy) -> Self {
        Self { policy }
    }

    /// File-bearing sections must use a field the policy knows about; anything
    /// else is rejected rather than silently dropped.
    pub fn route(&self, section: &SectionDescriptor) -> Result<Route, IngestError> {
        if !section.is_file() {
            return Ok(Route::Text);
        }

        match self.policy.sink_for(&section.name) {
            Some(sink) => Ok(Route::File(sink)),
            None => Err(IngestError::UnexpectedFilePart {
                field: section.name.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(name: &str, file_name: Option<&str>) -> SectionDescriptor {
        SectionDescriptor {
            name: name.to_string(),
            file_name: file_name.map(str::to_string),
            content_type: None,
            charset: None,
        }
    }

    #[test]
    fn routes_by_policy() {
        let router = SectionRouter::new(FilePolicy::default());
        assert_eq!(
            router.route(&section("File", Some("a.txt"))).unwrap(),
            Route::File(SinkKind::Named)
        );
        assert_eq!(
            router.route(&section("FileImage", Some("cat.png"))).unwrap(),
            Route::File(SinkKind::Identified)
        );
        assert_eq!(router.route(&section("Title", None)).unwrap(), Route::Text);
        // A text value under a file field is still text
        assert_eq!(router.route(&section("File", None)).unwrap(), Route::Text);
    }

    #[test]
    fn unknown_file_field_is_rejected() {
        let router = SectionRouter::new(FilePolicy::default());
        let err = router
            .route(&section("Attachment", Some("x.bin")))
            .unwrap_err();
        assert!(matches!(err, IngestError::UnexpectedFilePart { field } if field == "Attachment"));
    }
}
