//! Content kind to file extension mapping

/// Extension used when the content kind is missing or unknown
pub const DEFAULT_EXTENSION: &str = "bin";

/// Preferred extensions for common kinds. `mime_guess` lists several
/// candidates for these (`htm`/`html`, `jpe`/`jpeg`/`jpg`) in no useful order.
const PREFERRED: &[(&str, &str)] = &[
    ("text/html", "html"),
    ("application/xhtml+xml", "xhtml"),
    ("text/plain", "txt"),
    ("text/css", "css"),
    ("text/javascript", "js"),
    ("application/javascript", "js"),
    ("application/json", "json"),
    ("application/xml", "xml"),
    ("text/xml", "xml"),
    ("application/pdf", "pdf"),
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/svg+xml", "svg"),
    ("video/mp4", "mp4"),
    ("application/zip", "zip"),
];

/// Strips parameters from a Content-Type value and lowercases it
///
/// `"Text/HTML; charset=utf-8"` becomes `"text/html"`.
pub fn essence(kind: &str) -> String {
    kind.split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Picks a file extension (without the dot) for a content kind
pub fn extension_for(kind: &str) -> &'static str {
    let essence = essence(kind);
    if essence.is_empty() {
        return DEFAULT_EXTENSION;
    }

    if let Some((_, ext)) = PREFERRED.iter().find(|(mime, _)| *mime == essence) {
        return *ext;
    }

    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| exts.first().copied())
        .unwrap_or(DEFAULT_EXTENSION)
}
