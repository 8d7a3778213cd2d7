//! Image URL normalization for portraits and thumbnails.
//!
//! Admins paste image references in whatever shape the host gave them:
//! bare Imgur ids, `imgur.com/...` links without a scheme, Discord CDN
//! links, or site-relative paths. Display code needs a fetchable URL;
//! storage prefers the short Imgur form.

/// Shown when a row has no image at all.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

const IMGUR_DIRECT: &str = "https://i.imgur.com";

/// Turn any accepted image reference into a fetchable URL.
pub fn normalize_image_url(raw: &str) -> String {
    let url = raw.trim();
    if url.is_empty() {
        return PLACEHOLDER_IMAGE.to_owned();
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_owned();
    }

    if url.contains("imgur.com") || url.contains("i.imgur") {
        if url.starts_with("i.imgur.com/") {
            return format!("https://{url}");
        }
        if let Some(id) = url.strip_prefix("imgur.com/") {
            return if id.contains('.') {
                format!("https://i.{url}")
            } else {
                format!("{IMGUR_DIRECT}/{id}.jpg")
            };
        }
        return format!("https://{url}");
    }

    if url.contains("cdn.discordapp.com") || url.contains("media.discordapp.net") {
        return format!("https://{url}");
    }

    if url.starts_with('/') {
        return url.to_owned();
    }

    // A bare token is taken to be an Imgur id.
    if !url.contains('/') && !url.contains('.') {
        return format!("{IMGUR_DIRECT}/{url}.jpg");
    }

    url.to_owned()
}

/// Reduce an Imgur URL to `imgur.com/{id}` for storage; others pass through.
pub fn storage_image_url(raw: &str) -> String {
    let url = raw.trim();
    if let Some(start) = url.find("imgur.com/") {
        let rest = &url[start + "imgur.com/".len()..];
        let id: String = rest.chars().take_while(char::is_ascii_alphanumeric).collect();
        if !id.is_empty() {
            return format!("imgur.com/{id}");
        }
    }
    url.to_owned()
}
