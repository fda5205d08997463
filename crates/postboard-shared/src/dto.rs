//! Data Transfer Objects - request types for the HTTP surface.

use serde::{Deserialize, Serialize};

/// Query string of every listing page.
///
/// `page` stays a raw string so that junk values fall back to the first page
/// instead of failing extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Form body of the new-post and edit-post pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFormRequest {
    #[serde(default)]
    pub text: String,
    /// Group slug; empty for no group.
    #[serde(default)]
    pub group: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_are_optional() {
        let form: PostFormRequest = serde_urlencoded::from_str("").unwrap();
        assert_eq!(form.text, "");
        assert_eq!(form.group, None);

        let form: PostFormRequest =
            serde_urlencoded::from_str("text=Hello+there&group=cats").unwrap();
        assert_eq!(form.text, "Hello there");
        assert_eq!(form.group.as_deref(), Some("cats"));
    }

    #[test]
    fn test_page_query_accepts_any_value() {
        let query: PageQuery = serde_urlencoded::from_str("page=abc").unwrap();
        assert_eq!(query.page.as_deref(), Some("abc"));
    }
}
