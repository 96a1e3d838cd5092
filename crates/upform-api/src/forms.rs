//! Form records bound from uploads

use serde::Serialize;
use upform_core::{BindForm, FormBinder};

/// Metadata submitted alongside a downloadable file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadForm {
    pub title: String,
    pub description: String,
    pub category: String,
}

impl BindForm for DownloadForm {
    fn bind(form: &mut FormBinder<'_>) -> Option<Self> {
        let title = form.required::<String>("Title");
        let description = form.text("Description");
        let category = form.required::<String>("Category");

        Some(Self {
            title: title?,
            description,
            category: category?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upform_core::FormValues;

    #[test]
    fn binds_all_fields() {
        let mut values = FormValues::new();
        values.append("title", " Demo ");
        values.append("Category", "docs");

        let form: DownloadForm = FormBinder::bind(&values).unwrap();
        assert_eq!(form.title, "Demo");
        assert_eq!(form.description, "");
        assert_eq!(form.category, "docs");
    }

    #[test]
    fn reports_every_missing_field() {
        let mut values = FormValues::new();
        values.append("Title", "");
        values.append("Description", "no title, no category");

        let errors = FormBinder::bind::<DownloadForm>(&values).unwrap_err();
        assert_eq!(errors.fields(), vec!["Title", "Category"]);
    }
}
