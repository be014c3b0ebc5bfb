//! Media-type detection from leading content bytes.

/// Number of leading bytes inspected by [`detect`].
pub const SNIFF_LEN: usize = 512;

/// Fallback media type for unrecognised binary content.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Media type used for plain UTF-8 text, including extracted-text sidecars.
pub const TEXT_PLAIN: &str = "text/plain";

/// Detects the media type of content from its leading bytes.
///
/// `head` should hold the first [`SNIFF_LEN`] bytes of the content (or all
/// of it, when shorter). Known binary signatures win; otherwise content that
/// decodes as UTF-8 without NUL bytes is reported as `text/plain`.
pub fn detect(head: &[u8]) -> &'static str {
    if head.is_empty() {
        return OCTET_STREAM;
    }

    if head.starts_with(b"%PDF") {
        return "application/pdf";
    }

    if head.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return "image/png";
    }

    if head.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }

    if head.starts_with(b"GIF87a") || head.starts_with(b"GIF89a") {
        return "image/gif";
    }

    if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"WEBP" {
        return "image/webp";
    }

    if head.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || head.starts_with(&[0x4D, 0x4D, 0x00, 0x2A]) {
        return "image/tiff";
    }

    // Also covers DOCX, XLSX, ODT and friends; telling them apart needs the archive index.
    if head.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
        return "application/zip";
    }

    if head.starts_with(&[0x1F, 0x8B]) {
        return "application/gzip";
    }

    if is_text(head) {
        return TEXT_PLAIN;
    }

    OCTET_STREAM
}

/// The sample may end in the middle of a multi-byte character, which still counts as text.
fn is_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }

    match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}
