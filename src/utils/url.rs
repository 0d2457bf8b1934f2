//! URL utilities for consistent URL handling
//!
//! This module provides utilities for normalizing the backend origin and
//! constructing endpoint and avatar URLs without double slashes.

/// Normalize a base URL by removing trailing slashes
///
/// This ensures consistent URL construction when appending endpoints,
/// preventing double slashes in the final URLs.
///
/// # Examples
///
/// ```
/// use botline::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8000"), "http://localhost:8000");
/// assert_eq!(normalize_base_url("http://localhost:8000/"), "http://localhost:8000");
/// assert_eq!(normalize_base_url("http://localhost:8000///"), "http://localhost:8000");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete endpoint URL from a base URL and endpoint path
///
/// # Examples
///
/// ```
/// use botline::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8000", "chat/ask"),
///     "http://localhost:8000/chat/ask"
/// );
/// assert_eq!(
///     construct_api_url("http://localhost:8000/", "/chat/ask"),
///     "http://localhost:8000/chat/ask"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Resolve a bot avatar reference against the backend origin.
///
/// The backend stores avatars as bare filenames served from its static
/// `uploads/` path, but imported bots may carry a full URL already.
pub fn resolve_avatar_url(base_url: &str, avatar: &str) -> String {
    if avatar.starts_with("http://") || avatar.starts_with("https://") {
        avatar.to_string()
    } else {
        construct_api_url(base_url, &format!("uploads/{avatar}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:8000"),
            "http://localhost:8000"
        );

        assert_eq!(
            normalize_base_url("http://localhost:8000/"),
            "http://localhost:8000"
        );

        assert_eq!(
            normalize_base_url("http://localhost:8000///"),
            "http://localhost:8000"
        );

        assert_eq!(normalize_base_url(""), "");

        assert_eq!(normalize_base_url("///"), "");
    }

    #[test]
    fn test_construct_api_url() {
        assert_eq!(
            construct_api_url("http://localhost:8000", "bots/public"),
            "http://localhost:8000/bots/public"
        );

        assert_eq!(
            construct_api_url("http://localhost:8000/", "bots/public"),
            "http://localhost:8000/bots/public"
        );

        assert_eq!(
            construct_api_url("http://localhost:8000", "/chat/ask"),
            "http://localhost:8000/chat/ask"
        );

        assert_eq!(
            construct_api_url("http://localhost:8000///", "chat/restart"),
            "http://localhost:8000/chat/restart"
        );
    }

    #[test]
    fn test_resolve_avatar_url() {
        assert_eq!(
            resolve_avatar_url("http://localhost:8000", "b1_cat.png"),
            "http://localhost:8000/uploads/b1_cat.png"
        );

        // Absolute references pass through untouched.
        assert_eq!(
            resolve_avatar_url("http://localhost:8000", "https://cdn.example.com/cat.png"),
            "https://cdn.example.com/cat.png"
        );

        assert_eq!(
            resolve_avatar_url("http://localhost:8000/", "b1_cat.png"),
            "http://localhost:8000/uploads/b1_cat.png"
        );
    }
}
