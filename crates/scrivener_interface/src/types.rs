//! Value types exchanged with collaborators.

use serde::{Deserialize, Serialize};

/// An image returned by an [`ImageGeneration`](crate::ImageGeneration) backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Image location
    pub url: String,
    /// Pixel size actually requested
    pub size: String,
}

/// Input to a [`CoverGenerator`](crate::CoverGenerator).
///
/// # Examples
///
/// ```
/// use scrivener_interface::CoverRequest;
///
/// let req = CoverRequest::builder()
///     .title("秋天")
///     .content("落叶铺满了小路")
///     .build()
///     .unwrap();
/// assert_eq!(req.size(), "2k");
/// assert!(req.style_template().is_none());
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder, derive_getters::Getters,
)]
#[builder(setter(into))]
pub struct CoverRequest {
    /// Article title
    #[builder(default)]
    title: String,
    /// Article body
    content: String,
    /// Optional style template with `{title}`/`{content}` placeholders
    #[builder(default, setter(into, strip_option))]
    style_template: Option<String>,
    /// Size label (`1k`, `2k`, `4k`) or explicit `WxH`
    #[builder(default = "\"2k\".to_string()")]
    size: String,
}

impl CoverRequest {
    /// Creates a new request builder.
    pub fn builder() -> CoverRequestBuilder {
        CoverRequestBuilder::default()
    }
}
