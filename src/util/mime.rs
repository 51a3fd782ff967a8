/// MIME type used when an image URL has no recognised extension.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Extension lookup table for enclosure images.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
];

/// Infers an image MIME type from the file extension of a URL or path.
///
/// The query string and fragment are ignored and matching is
/// case-insensitive. Unknown or missing extensions fall back to
/// [`DEFAULT_IMAGE_MIME`]; that fallback is expected and not reported.
///
/// # Examples
///
/// ```
/// use syndicate::util::image_mime_type;
///
/// assert_eq!(image_mime_type("/img/cover.webp"), "image/webp");
/// assert_eq!(image_mime_type("https://cdn.example.com/a.PNG?w=800"), "image/png");
/// assert_eq!(image_mime_type("/img/legacy.bmp"), "image/jpeg");
/// ```
pub fn image_mime_type(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file_name = path.rsplit('/').next().unwrap_or(path);

    let Some((stem, extension)) = file_name.rsplit_once('.') else {
        return DEFAULT_IMAGE_MIME;
    };
    if stem.is_empty() {
        // Dotfiles like ".png" have no extension
        return DEFAULT_IMAGE_MIME;
    }

    IMAGE_TYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_IMAGE_MIME)
}
