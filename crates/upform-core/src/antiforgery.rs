//! Anti-forgery validation seam.
//!
//! Ingestion only needs a yes/no answer before it touches the request body; how
//! tokens are issued and checked belongs to the hosting application.

/// Token material presented with a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AntiforgeryContext {
    /// Token sent in the request header (e.g. `X-CSRF-Token`)
    pub header_token: Option<String>,
    /// Token sent back in the anti-forgery cookie
    pub cookie_token: Option<String>,
}

pub trait AntiforgeryValidator: Send + Sync {
    fn is_request_valid(&self, context: &AntiforgeryContext) -> bool;
}

impl<F> AntiforgeryValidator for F
where
    F: Fn(&AntiforgeryContext) -> bool + Send + Sync,
{
    fn is_request_valid(&self, context: &AntiforgeryContext) -> bool {
        self(context)
    }
}
