use thiserror::Error;
use url::Url;

/// Errors that can occur while turning configured or authored links into
/// absolute URLs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
}

/// Parses the site's base URL.
///
/// The returned URL always ends with `/` so that relative joins keep any
/// path prefix the site is mounted under (`https://example.com/notes/`).
///
/// # Errors
///
/// Returns [`LinkError`] if the string is not an absolute `http`/`https`
/// URL with a host.
///
/// # Examples
///
/// ```
/// use syndicate::util::parse_site_url;
///
/// let base = parse_site_url("https://example.com/notes").unwrap();
/// assert_eq!(base.as_str(), "https://example.com/notes/");
///
/// assert!(parse_site_url("ftp://example.com").is_err());
/// assert!(parse_site_url("/relative").is_err());
/// ```
pub fn parse_site_url(url_str: &str) -> Result<Url, LinkError> {
    let mut url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(LinkError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(LinkError::MissingHost);
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Resolves `href` against the site base URL.
///
/// Absolute URLs are returned as-is, site-relative paths (`/images/a.png`)
/// resolve against the origin, and bare relative paths resolve against the
/// base path.
pub fn absolute_url(base: &Url, href: &str) -> Result<Url, LinkError> {
    let href = href.trim();
    match Url::parse(href) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(base.join(href)?),
        Err(e) => Err(LinkError::InvalidUrl(e)),
    }
}

/// Returns true when `id` is an absolute http(s) URL a reader can follow.
///
/// RSS marks such guids `isPermaLink="true"`.
pub fn is_dereferenceable(id: &str) -> bool {
    Url::parse(id)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}
