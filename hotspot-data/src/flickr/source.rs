//! [`PhotoSource`] backed by `flickr.photos.search`.

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use hotspot_core::{PhotoRecord, PhotoSource, PhotoSourceError, Region};
use log::{debug, warn};
use reqwest::Client;
use thiserror::Error;
use url::Url;

use super::response::{FlickrPhoto, PhotoPage, SearchResponse};

/// Flickr REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.flickr.com/services/rest/";

/// Default user agent for Flickr requests.
pub const DEFAULT_USER_AGENT: &str = "hotspot-engine/0.1";

/// Largest search radius Flickr accepts, in kilometres.
pub const MAX_RADIUS_KM: f64 = 32.0;

/// Photos requested per page unless configured otherwise.
pub const DEFAULT_PER_PAGE: u32 = 250;

/// Largest page size Flickr honours.
pub const MAX_PER_PAGE: u32 = 500;

/// Pages fetched per region unless configured otherwise.
pub const DEFAULT_MAX_PAGES: u32 = 1;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

const EXTRAS: &str = "geo,tags,url_b,owner_name,date_upload,views,count_faves";

/// Errors raised while building a [`FlickrPhotoSource`].
#[derive(Debug, Error)]
pub enum FlickrBuildError {
    /// No API key was supplied.
    #[error("Flickr API key must not be empty")]
    MissingApiKey,
    /// The base URL could not be parsed.
    #[error("invalid Flickr base URL {url}")]
    InvalidBaseUrl {
        /// URL as supplied.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// `per_page` is outside `1..=500`.
    #[error("per_page must be between 1 and {MAX_PER_PAGE}, got {per_page}")]
    InvalidPageSize {
        /// Page size as supplied.
        per_page: u32,
    },
    /// `max_pages` is zero.
    #[error("max_pages must be at least 1")]
    ZeroMaxPages,
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

/// Configuration for [`FlickrPhotoSource`].
#[derive(Clone)]
pub struct FlickrConfig {
    /// Flickr API key.
    pub api_key: String,
    /// REST endpoint, overridable for testing.
    pub base_url: String,
    /// Photos per page.
    pub per_page: u32,
    /// Maximum pages fetched per region.
    pub max_pages: u32,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl std::fmt::Debug for FlickrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlickrConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("per_page", &self.per_page)
            .field("max_pages", &self.max_pages)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl FlickrConfig {
    /// Create a configuration with the given API key and default settings.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Set the REST endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the page size.
    #[must_use]
    pub const fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Set the page limit.
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Fetches geotagged photos around a region centre, most interesting first.
///
/// # Example
///
/// ```no_run
/// use hotspot_core::{PhotoSource, Region};
/// use hotspot_data::flickr::{FlickrConfig, FlickrPhotoSource};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let source = FlickrPhotoSource::new(FlickrConfig::new("api-key").with_max_pages(2))?;
/// let region = Region::new(43.6532, -79.3832, 5_000.0)?;
/// let photos = source.fetch(&region).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FlickrPhotoSource {
    client: Client,
    config: FlickrConfig,
    base_url: Url,
}

impl FlickrPhotoSource {
    /// Build a source from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty API key, an unparsable base URL, a page
    /// size outside `1..=500`, zero `max_pages`, or when the HTTP client fails
    /// to build.
    pub fn new(config: FlickrConfig) -> Result<Self, FlickrBuildError> {
        if config.api_key.trim().is_empty() {
            return Err(FlickrBuildError::MissingApiKey);
        }
        if !(1..=MAX_PER_PAGE).contains(&config.per_page) {
            return Err(FlickrBuildError::InvalidPageSize {
                per_page: config.per_page,
            });
        }
        if config.max_pages == 0 {
            return Err(FlickrBuildError::ZeroMaxPages);
        }
        let base_url =
            Url::parse(&config.base_url).map_err(|source| FlickrBuildError::InvalidBaseUrl {
                url: config.base_url.clone(),
                source,
            })?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(FlickrBuildError::HttpClient)?;
        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &FlickrConfig {
        &self.config
    }

    /// Build the search URL for `region` and `page`.
    ///
    /// The radius is converted to kilometres and capped at
    /// [`MAX_RADIUS_KM`].
    fn search_url(&self, region: &Region, page: u32) -> Url {
        let radius_km = region.radius_km().min(MAX_RADIUS_KM);
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("method", "flickr.photos.search")
            .append_pair("api_key", &self.config.api_key)
            .append_pair("lat", &format!("{:.6}", region.latitude()))
            .append_pair("lon", &format!("{:.6}", region.longitude()))
            .append_pair("radius", &format!("{radius_km:.3}"))
            .append_pair("radius_units", "km")
            .append_pair("has_geo", "1")
            .append_pair("accuracy", "16")
            .append_pair("extras", EXTRAS)
            .append_pair("sort", "interestingness-desc")
            .append_pair("per_page", &self.config.per_page.to_string())
            .append_pair("page", &page.to_string())
            .append_pair("format", "json")
            .append_pair("nojsoncallback", "1");
        url
    }

    /// Label used in errors and logs; never includes the API key.
    fn endpoint_label(&self, page: u32) -> String {
        format!(
            "{}?method=flickr.photos.search&page={page}",
            self.base_url.as_str().trim_end_matches('?')
        )
    }

    async fn fetch_page(&self, region: &Region, page: u32) -> Result<PhotoPage, PhotoSourceError> {
        let label = self.endpoint_label(page);
        let response = self
            .client
            .get(self.search_url(region, page))
            .send()
            .await
            .map_err(|err| convert_reqwest_error(&err, &label))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(&err, &label))?;

        let body: SearchResponse =
            response
                .json()
                .await
                .map_err(|err| PhotoSourceError::Decode {
                    message: describe(&err),
                })?;

        convert_response(body)
    }
}

/// Convert a reqwest error to a [`PhotoSourceError`].
fn convert_reqwest_error(error: &reqwest::Error, url: &str) -> PhotoSourceError {
    if error.is_timeout() {
        return PhotoSourceError::Timeout {
            url: url.to_owned(),
        };
    }

    if let Some(status) = error.status() {
        return PhotoSourceError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or_default().to_owned(),
        };
    }

    if error.is_decode() {
        return PhotoSourceError::Decode {
            message: describe(error),
        };
    }

    PhotoSourceError::Network {
        url: url.to_owned(),
        message: describe(error),
    }
}

// reqwest's own message embeds the request URL, which carries the API key.
fn describe(error: &reqwest::Error) -> String {
    error
        .source()
        .map_or_else(|| "request failed".to_owned(), ToString::to_string)
}

/// Unwrap the result page, mapping `stat != "ok"` to a service error.
fn convert_response(response: SearchResponse) -> Result<PhotoPage, PhotoSourceError> {
    if !response.is_ok() {
        return Err(PhotoSourceError::Service {
            code: response.code.unwrap_or_default(),
            message: response.message.unwrap_or_default(),
        });
    }
    response.photos.ok_or_else(|| PhotoSourceError::Decode {
        message: "Flickr response missing photos page".to_owned(),
    })
}

fn into_records(page: PhotoPage) -> Vec<PhotoRecord> {
    let listed = page.photo.len();
    let records: Vec<_> = page
        .photo
        .into_iter()
        .filter_map(FlickrPhoto::into_record)
        .collect();
    let skipped = listed.saturating_sub(records.len());
    if skipped > 0 {
        warn!("skipped {skipped} Flickr photos without an upload time");
    }
    records
}

#[async_trait(?Send)]
impl PhotoSource for FlickrPhotoSource {
    async fn fetch(&self, region: &Region) -> Result<Vec<PhotoRecord>, PhotoSourceError> {
        let mut photos = Vec::new();
        for page in 1..=self.config.max_pages {
            let result_page = self.fetch_page(region, page).await?;
            let total_pages = result_page.total_pages();
            let listed = result_page.photo.len();
            photos.extend(into_records(result_page));
            debug!("Flickr page {page}/{total_pages} listed {listed} photos");
            if listed == 0 || u64::from(page) >= total_pages {
                break;
            }
        }
        Ok(photos)
    }
}
