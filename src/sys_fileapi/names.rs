//! File name helpers: base-name extraction, disambiguation, escaping.

const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Keep only the last path segment of a client-supplied name.
///
/// Returns `None` for names that do not denote a file inside the upload
/// directory (empty, `.` or `..`). Separators are the host's: on Unix a
/// backslash is an ordinary name character.
pub fn base_name(client_path: &str) -> Option<String> {
    use std::path::is_separator;

    let trimmed = client_path.trim_end_matches(is_separator);
    let last = trimmed.rsplit(is_separator).next().unwrap_or_default();
    match last {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// Base name plus `sanitize_filename` cleanup, for names we are about to create.
pub fn upload_name(client_path: &str) -> Option<String> {
    let base = base_name(client_path)?;
    let cleaned = sanitize_filename::sanitize(&base);
    match cleaned.as_str() {
        "" | "." | ".." => None,
        _ => Some(cleaned),
    }
}

/// Split at the last dot: `("photo", ".jpg")`, `("archive.tar", ".gz")`, `("README", "")`.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) => name.split_at(i),
        None => (name, ""),
    }
}

/// `photo.jpg` -> `photo_<unix_secs>.jpg`
pub fn disambiguate(base: &str, unix_secs: u64) -> String {
    let (stem, ext) = split_extension(base);
    format!("{stem}_{unix_secs}{ext}")
}

/// Like [`disambiguate`], with `-<attempt>` after the timestamp for retries.
pub fn disambiguate_attempt(base: &str, unix_secs: u64, attempt: u32) -> String {
    if attempt == 0 {
        return disambiguate(base, unix_secs);
    }
    let (stem, ext) = split_extension(base);
    format!("{stem}_{unix_secs}-{attempt}{ext}")
}

pub fn is_image(name: &str) -> bool {
    let (_, ext) = split_extension(name);
    IMAGE_EXTENSIONS
        .iter()
        .any(|candidate| ext.eq_ignore_ascii_case(candidate))
}

/// Simple HTML escaper
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
