use axum::http::{header, HeaderMap};

// ---------------------------------------------------------------------------
// Pseudo-user identity
// ---------------------------------------------------------------------------

/// Derive the opaque visitor identifier used to scope likes and comments:
/// client IP (first `X-Forwarded-For` hop, else `X-Real-Ip`) plus a
/// truncated user-agent, sanitized to `[a-zA-Z0-9-]`.
///
/// This is a weak, spoofable pseudo-identity that only scopes a like button
/// per visitor. The repositories treat the result as an opaque string.
pub fn user_id_from_headers(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());
    let ip = forwarded.or(real_ip).unwrap_or("unknown");

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    let truncated: String = user_agent.chars().take(20).collect();

    format!("{}-{}", ip, truncated)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

/// Best-effort client IP for the brute-force tracker. Falls back to the
/// unspecified address when no proxy header is present or parseable.
pub fn client_ip_from_headers(headers: &HeaderMap) -> std::net::IpAddr {
    let candidate = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()));

    candidate
        .and_then(|v| v.parse().ok())
        .unwrap_or(std::net::IpAddr::from([0, 0, 0, 0]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_user_id_combines_ip_and_user_agent() {
        let headers = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("user-agent", "Mozilla/5.0 (X11; Linux)"),
        ]);
        let id = user_id_from_headers(&headers);
        assert!(id.starts_with("203-0-113-7-"));
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
        // User-agent contributes at most 20 characters.
        assert!(id.len() <= "203.0.113.7".len() + 1 + 20);
    }

    #[test]
    fn test_user_id_falls_back_to_real_ip_then_unknown() {
        let with_real_ip = headers(&[("x-real-ip", "198.51.100.2")]);
        assert!(user_id_from_headers(&with_real_ip).starts_with("198-51-100-2-"));

        let bare = HeaderMap::new();
        assert!(user_id_from_headers(&bare).starts_with("unknown-"));
    }

    #[test]
    fn test_same_headers_same_identity() {
        let a = headers(&[("x-real-ip", "198.51.100.2"), ("user-agent", "curl/8.5")]);
        assert_eq!(user_id_from_headers(&a), user_id_from_headers(&a));
    }

    #[test]
    fn test_client_ip_parsing() {
        let proxied = headers(&[("x-forwarded-for", "203.0.113.7, 10.0.0.1")]);
        assert_eq!(
            client_ip_from_headers(&proxied),
            "203.0.113.7".parse::<std::net::IpAddr>().unwrap()
        );

        let garbage = headers(&[("x-forwarded-for", "not-an-ip")]);
        assert_eq!(
            client_ip_from_headers(&garbage),
            std::net::IpAddr::from([0, 0, 0, 0])
        );
    }
}
