use crate::ServiceError;
use crate::metadata::{UrlMetadata, VXTWITTER_ORIGIN, extract_from_html};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{error, warn};

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Makes sites render their Open Graph tags server side.
pub const USER_AGENT: &str =
    "facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)";

const TWITTER_ORIGINS: [&str; 2] = ["https://x.com", "https://twitter.com"];

/// Source of preview metadata for a URL.
///
/// Implementations never fail: anything that goes wrong is logged and
/// reported as `None`.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<UrlMetadata>;
}

/// Adds a missing scheme and routes x.com / twitter.com through vxtwitter.
pub fn normalize_url(url: &str) -> String {
    let url = if url.starts_with("http") {
        url.to_string()
    } else {
        format!("http://{url}")
    };

    for origin in TWITTER_ORIGINS {
        if let Some(rest) = url.strip_prefix(origin) {
            if rest.is_empty() || rest.starts_with(['/', '?', '#']) {
                return format!("{VXTWITTER_ORIGIN}{rest}");
            }
        }
    }

    url
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ServiceError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl MetadataFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<UrlMetadata> {
        let url = normalize_url(url);

        let response = match self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => response,
            Err(e) => {
                error!("Error scraping {}: {}", url, e);
                return None;
            }
        };

        let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
        else {
            warn!("No content type for {}", url);
            return None;
        };

        match classify(&content_type) {
            ContentKind::Html => match response.bytes().await {
                Ok(body) => extract_from_html(&String::from_utf8_lossy(&body), &url),
                Err(e) => {
                    error!("Error reading body of {}: {}", url, e);
                    None
                }
            },
            ContentKind::Image => Some(UrlMetadata::image(&url)),
            ContentKind::Video => Some(UrlMetadata::video(&url, &content_type)),
            ContentKind::Unknown => {
                warn!("Unknown content type {} for {}", content_type, url);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    Html,
    Image,
    Video,
    Unknown,
}

fn classify(content_type: &str) -> ContentKind {
    let content_type = content_type.trim().to_ascii_lowercase();
    if content_type.starts_with("text/html") {
        ContentKind::Html
    } else if content_type.starts_with("image/") {
        ContentKind::Image
    } else if content_type.starts_with("video/") {
        ContentKind::Video
    } else {
        ContentKind::Unknown
    }
}
