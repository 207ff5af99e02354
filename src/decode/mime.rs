use std::path::Path;

/// MIME types the decoder will attempt.
///
/// `multimedia/mp4` is a legacy alias still present in older stored object
/// rows and is accepted alongside the standard type.
const SUPPORTED_MIME_TYPES: &[&str] = &[
    "multimedia/mp4",
    "video/mp4",
    "video/avi",
    "video/mpeg",
    "video/quicktime",
    "video/webm",
];

/// The decoder's MIME allow-list.
pub fn supported_mime_types() -> &'static [&'static str] {
    SUPPORTED_MIME_TYPES
}

/// Resolve a path's MIME type from its extension, case-insensitive.
pub fn mime_type_of(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "mp4" | "m4v" => Some("video/mp4"),
        "avi" => Some("video/avi"),
        "mpg" | "mpeg" => Some("video/mpeg"),
        "mov" | "qt" => Some("video/quicktime"),
        "webm" => Some("video/webm"),
        _ => None,
    }
}

/// Whether the decoder will attempt this file.
pub fn is_supported(path: &Path) -> bool {
    mime_type_of(path)
        .map(|mime| SUPPORTED_MIME_TYPES.contains(&mime))
        .unwrap_or(false)
}
