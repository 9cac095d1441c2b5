//! Mission parameters: what one run of the pipeline is about.

use serde::{Deserialize, Serialize};
use url::Url;

/// The parameters of a single mission.
///
/// Built once when the operator starts a run and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionConfig {
    /// Main keyword or topic. Required.
    pub topic: String,
    pub content_type: ContentType,
    pub target_group: String,
    pub language: String,
    pub region: String,
}

impl MissionConfig {
    /// Whether the topic carries anything besides whitespace.
    pub fn has_topic(&self) -> bool {
        !self.topic.trim().is_empty()
    }

    /// The stream URL for this mission: `endpoint` with the parameters as query pairs.
    ///
    /// Existing query pairs on the endpoint are kept.
    pub fn stream_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("topic", &self.topic)
            .append_pair("content_type", self.content_type.as_str())
            .append_pair("target_group", &self.target_group)
            .append_pair("language", &self.language)
            .append_pair("location", &self.region);
        url
    }
}

/// The kind of content the pipeline should brief.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    #[default]
    BlogPost,
    LandingPage,
    ProductDescription,
    Whitepaper,
}

impl ContentType {
    pub const ALL: [Self; 4] = [
        Self::BlogPost,
        Self::LandingPage,
        Self::ProductDescription,
        Self::Whitepaper,
    ];

    /// Display name, also the value sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BlogPost => "Blog Post",
            Self::LandingPage => "Landing Page",
            Self::ProductDescription => "Product Description",
            Self::Whitepaper => "Whitepaper",
        }
    }

    /// The next content type, wrapping around.
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    /// The previous content type, wrapping around.
    pub fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}
