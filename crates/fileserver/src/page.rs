//! Index page and download link generation

use crate::handle::FileHandle;

/// Path of the download route
pub const FILE_ROUTE: &str = "/file";

/// Query parameter carrying the canonical key
pub const URI_PARAM: &str = "uri";

/// Relative download link for a handle
pub fn file_href(handle: &FileHandle) -> String {
    format!(
        "{}?{}={}",
        FILE_ROUTE,
        URI_PARAM,
        urlencoding::encode(handle.canonical_key())
    )
}

/// One anchor line of the index page
pub fn file_link(handle: &FileHandle) -> String {
    format!(
        "<a href=\"{}\">Download -> {}</a>",
        file_href(handle),
        escape_html(&handle.display_name())
    )
}

/// Render the browsable index for a listing, links in listing order
pub fn render_index(handles: &[FileHandle]) -> String {
    let links = handles
        .iter()
        .map(file_link)
        .collect::<Vec<_>>()
        .join("<br>");

    format!(
        "<html>\n<head></head>\n<body>\n    <h1>File Download</h1>\n    <div>{}</div>\n</body>\n</html>",
        links
    )
}

/// Escape text for inclusion in HTML content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
