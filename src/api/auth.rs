use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use constant_time_eq::constant_time_eq;

pub const COOKIE_NAME: &str = "logs_authenticated";

pub fn is_authenticated(jar: &SignedCookieJar) -> bool {
    jar.get(COOKIE_NAME)
        .map(|cookie| cookie.value() == "true")
        .unwrap_or(false)
}

pub fn password_matches(given: &str, expected: &str) -> bool {
    constant_time_eq(given.as_bytes(), expected.as_bytes())
}

/// Marks the browser session as authenticated for `ttl_minutes`.
pub fn sign_in(jar: SignedCookieJar, ttl_minutes: i64) -> SignedCookieJar {
    let cookie = Cookie::build((COOKIE_NAME, "true"))
        .path("/admin")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(ttl_minutes))
        .build();

    jar.add(cookie)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;

    #[test]
    fn password_must_match_exactly() {
        assert!(password_matches("hunter2", "hunter2"));
        assert!(!password_matches("hunter", "hunter2"));
        assert!(!password_matches("", "hunter2"));
    }

    #[test]
    fn signed_in_jar_is_authenticated() {
        let jar = SignedCookieJar::new(Key::generate());
        assert!(!is_authenticated(&jar));

        let jar = sign_in(jar, 30);
        assert!(is_authenticated(&jar));
    }
}
