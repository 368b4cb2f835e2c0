//! Preview mode travels in a cookie between requests.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use st_core::Preview;
use tracing::debug;

pub const PREVIEW_COOKIE: &str = "st_preview";

/// Preview state carried by the request. Anything unreadable means off.
pub fn preview_from(jar: &CookieJar) -> Preview {
    let Some(cookie) = jar.get(PREVIEW_COOKIE) else {
        return Preview::off();
    };
    match serde_json::from_str::<Preview>(cookie.value()) {
        Ok(preview) => preview,
        Err(e) => {
            debug!("Ignoring malformed preview cookie: {}", e);
            Preview::off()
        }
    }
}

pub fn remember(jar: CookieJar, preview: &Preview) -> CookieJar {
    let value = serde_json::to_string(preview).unwrap_or_default();
    let cookie = Cookie::build((PREVIEW_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

pub fn forget(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(PREVIEW_COOKIE).path("/"))
}

/// Only same-site absolute paths are accepted as redirect targets.
pub fn safe_redirect(target: Option<&str>) -> String {
    match target {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_round_trip() {
        let jar = remember(CookieJar::new(), &Preview::on(Some("https://repo.example/previews/abc".into())));
        let preview = preview_from(&jar);
        assert!(preview.enabled);
        assert_eq!(preview.content_ref(), Some("https://repo.example/previews/abc"));

        let jar = forget(jar);
        assert_eq!(preview_from(&jar), Preview::off());
    }

    #[test]
    fn test_malformed_cookie_is_off() {
        let jar = CookieJar::new().add(Cookie::new(PREVIEW_COOKIE, "garbage"));
        assert_eq!(preview_from(&jar), Preview::off());
    }

    #[test]
    fn test_safe_redirect() {
        assert_eq!(safe_redirect(None), "/");
        assert_eq!(safe_redirect(Some("/post/hello")), "/post/hello");
        assert_eq!(safe_redirect(Some("https://evil.example")), "/");
        assert_eq!(safe_redirect(Some("//evil.example")), "/");
        assert_eq!(safe_redirect(Some("/\\evil.example")), "/");
    }
}
