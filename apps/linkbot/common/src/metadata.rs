//! Open Graph / Twitter card extraction from fetched pages.

use scraper::{Html, Selector};
use serde::Serialize;
use tracing::warn;

/// Origin that x.com and twitter.com links are fetched through.
pub const VXTWITTER_ORIGIN: &str = "https://vxtwitter.com";

/// Scraped preview data for one URL.
///
/// A `video_url` is only kept together with a `video_type`; a bare video
/// link without a declared MIME type is not a playable asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UrlMetadata {
    pub site: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub video_url: Option<String>,
    pub video_type: Option<String>,
    pub video_width: Option<i32>,
    pub video_height: Option<i32>,
}

impl UrlMetadata {
    /// The URL itself is an image.
    pub fn image(url: &str) -> Self {
        Self {
            image: Some(url.to_string()),
            ..Default::default()
        }
    }

    /// The URL itself is a video of the given content type.
    pub fn video(url: &str, content_type: &str) -> Self {
        Self {
            video_url: Some(url.to_string()),
            video_type: Some(content_type.to_string()),
            ..Default::default()
        }
    }
}

struct MetaTags {
    document: Html,
}

impl MetaTags {
    fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    fn property(&self, key: &str) -> Option<String> {
        self.lookup("property", key)
    }

    fn name(&self, key: &str) -> Option<String> {
        self.lookup("name", key)
    }

    fn lookup(&self, attr: &str, key: &str) -> Option<String> {
        let selector = Selector::parse(&format!(r#"meta[{attr}="{key}"]"#)).ok()?;
        self.document
            .select(&selector)
            .next()?
            .value()
            .attr("content")
            .map(str::to_string)
    }
}

/// Extract preview metadata from an HTML page fetched from `source_url`.
///
/// Returns `None` when the page has neither a title nor a description.
pub fn extract_from_html(html: &str, source_url: &str) -> Option<UrlMetadata> {
    let tags = MetaTags::parse(html);

    let (site, title) = if source_url.starts_with(VXTWITTER_ORIGIN) {
        (Some("Twitter / X".to_string()), tags.name("twitter:title"))
    } else {
        (tags.property("og:site_name"), tags.property("og:title"))
    };

    let image = tags
        .property("og:image")
        .filter(|image| image != "0" && image != "null");

    let video_type = tags.property("og:video:type").filter(|t| !t.is_empty());
    let video_url = match video_type {
        Some(_) => tags.property("og:video"),
        None => None,
    };
    let video_width = parse_dimension(
        tags.property("og:video:width"),
        "og:video:width",
        source_url,
    );
    let video_height = parse_dimension(
        tags.property("og:video:height"),
        "og:video:height",
        source_url,
    );

    let description = tags.property("og:description");
    if title.is_none() && description.is_none() {
        return None;
    }

    Some(UrlMetadata {
        site,
        title,
        description,
        image,
        video_url,
        video_type,
        video_width,
        video_height,
    })
}

fn parse_dimension(value: Option<String>, key: &str, source_url: &str) -> Option<i32> {
    let raw = value?;
    match raw.trim().parse::<i32>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring non-numeric {} {:?} for {}", key, raw, source_url);
            None
        }
    }
}
