//! Cookie helper for the admin session.
//!
//! The session token travels in an HttpOnly cookie. The legacy `isAdmin`
//! cookie set by older clients is never trusted and is cleared whenever the
//! session cookie is.

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};

use crate::config::SessionConfig;

const COOKIE_PATH: &str = "/";

#[derive(Debug, Clone)]
pub struct CookieHelper {
    session_name: String,
    legacy_name: String,
    secure: bool,
    same_site: &'static str,
    max_age_secs: i64,
}

impl CookieHelper {
    pub fn new(config: &SessionConfig) -> Self {
        let same_site = match config.same_site.to_lowercase().as_str() {
            "lax" => "Lax",
            "none" => "None",
            _ => "Strict",
        };
        Self {
            session_name: config.cookie_name.clone(),
            legacy_name: config.legacy_cookie_name.clone(),
            // Browsers reject SameSite=None without Secure.
            secure: config.cookie_secure || same_site == "None",
            same_site,
            max_age_secs: config.ttl_secs,
        }
    }

    pub fn session_cookie_name(&self) -> &str {
        &self.session_name
    }

    /// Set-Cookie value carrying a freshly issued token.
    pub fn build_session_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{}={}; Path={}; Max-Age={}",
            self.session_name, token, COOKIE_PATH, self.max_age_secs
        );
        self.push_attributes(&mut cookie);
        cookie
    }

    /// Set-Cookie value that expires `name` immediately.
    pub fn build_clear_cookie(&self, name: &str) -> String {
        let mut cookie = format!(
            "{}=; Path={}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            name, COOKIE_PATH
        );
        self.push_attributes(&mut cookie);
        cookie
    }

    pub fn add_session_cookie(&self, headers: &mut HeaderMap, token: &str) {
        if let Ok(value) = HeaderValue::from_str(&self.build_session_cookie(token)) {
            headers.append(SET_COOKIE, value);
        }
    }

    /// Clears both the session cookie and the legacy flag cookie.
    pub fn add_clear_cookies(&self, headers: &mut HeaderMap) {
        for name in [&self.session_name, &self.legacy_name] {
            if let Ok(value) = HeaderValue::from_str(&self.build_clear_cookie(name)) {
                headers.append(SET_COOKIE, value);
            }
        }
    }

    /// Extract a cookie value from request headers by name.
    pub fn extract_cookie<'a>(&self, headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|cookie_header| cookie_header.split(';'))
            .map(str::trim)
            .find_map(|cookie| {
                let (cookie_name, cookie_value) = cookie.split_once('=')?;
                (cookie_name == name && !cookie_value.is_empty()).then_some(cookie_value)
            })
    }

    pub fn extract_session_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        self.extract_cookie(headers, &self.session_name)
    }

    fn push_attributes(&self, cookie: &mut String) {
        cookie.push_str("; HttpOnly");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=");
        cookie.push_str(self.same_site);
    }
}
