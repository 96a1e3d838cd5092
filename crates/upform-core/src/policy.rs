//! Which form fields may carry file content, and where that content goes.

/// Storage sink for a file field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// Stored under its sanitized original file name (large primary files)
    Named,
    /// Stored under the upload identifier (secondary/thumbnail images)
    Identified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRoute {
    pub field: String,
    pub sink: SinkKind,
}

/// Accepted file fields. Any other field that carries a file name is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePolicy {
    routes: Vec<FileRoute>,
}

impl FilePolicy {
    /// The two-key convention: one primary file and one image
    pub fn new(primary_field: impl Into<String>, image_field: impl Into<String>) -> Self {
        Self {
            routes: vec![
                FileRoute {
                    field: primary_field.into(),
                    sink: SinkKind::Named,
                },
                FileRoute {
                    field: image_field.into(),
                    sink: SinkKind::Identified,
                },
            ],
        }
    }

    /// Accept an extra file field. An `Identified` sink can only be used once per
    /// upload since its file is named after the upload itself.
    pub fn with_route(mut self, field: impl Into<String>, sink: SinkKind) -> Result<Self, String> {
        let field = field.into();
        if self.routes.iter().any(|r| r.field == field) {
            return Err(format!("file field '{}' is already routed", field));
        }
        if sink == SinkKind::Identified && self.routes.iter().any(|r| r.sink == sink) {
            return Err("only one file field may use the identified sink".to_string());
        }
        self.routes.push(FileRoute { field, sink });
        Ok(self)
    }

    pub fn sink_for(&self, field: &str) -> Option<SinkKind> {
        self.routes.iter().find(|r| r.field == field).map(|r| r.sink)
    }

    pub fn routes(&self) -> &[FileRoute] {
        &self.routes
    }
}

impl Default for FilePolicy {
    fn default() -> Self {
        FilePolicy::new("File", "FileImage")
    }
}
