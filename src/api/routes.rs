//! API endpoints used by the step-up flow and the console routes that decide
//! redirect behavior after a failed refresh.

/// Admin API endpoints.
pub mod endpoints {
    pub const LOGIN: &str = "/auth/admin/login";
    pub const VERIFY_LOGIN_MFA: &str = "/auth/admin/verify-mfa";
    pub const REFRESH: &str = "/auth/admin/refresh";
    pub const LOGOUT: &str = "/auth/admin/logout";
    pub const FORGOT_PASSWORD: &str = "/auth/admin/forgot-password";
    pub const SET_PASSWORD: &str = "/auth/admin/set-password";
    pub const VERIFY_ACTION_MFA: &str = "/auth/admin/verify-action-mfa";
    pub const REGENERATE_BACKUP_CODES: &str = "/auth/admin/backup-codes/regenerate";
}

/// Console routes (what the user is looking at).
pub mod paths {
    pub const LOGIN: &str = "/login";
    pub const SET_PASSWORD: &str = "/set-password";
    pub const RESET_PASSWORD: &str = "/reset-password";
    pub const FORGOT_PASSWORD: &str = "/forgot-password";
    pub const DASHBOARD: &str = "/dashboard";
}

/// Endpoints that are unauthenticated by design. A `401` from any of these is
/// the real answer and must not start the refresh dance.
const REFRESH_EXCLUDED: &[&str] = &[
    endpoints::LOGIN,
    endpoints::VERIFY_LOGIN_MFA,
    endpoints::REFRESH,
    endpoints::FORGOT_PASSWORD,
    endpoints::SET_PASSWORD,
];

/// Endpoints whose requests are never replayed. A rejected action code must
/// reach the caller as-is; a replay would spend a second attempt.
const REPLAY_EXCLUDED: &[&str] = &[endpoints::VERIFY_ACTION_MFA];

const GUEST_ROUTES: &[&str] = &[
    paths::LOGIN,
    paths::SET_PASSWORD,
    paths::RESET_PASSWORD,
    paths::FORGOT_PASSWORD,
];

#[must_use]
pub fn skips_refresh(path: &str) -> bool {
    let path = normalize(path);
    REFRESH_EXCLUDED
        .iter()
        .chain(REPLAY_EXCLUDED)
        .any(|excluded| path == *excluded)
}

#[must_use]
pub fn is_guest_route(route: &str) -> bool {
    let route = normalize(route);
    GUEST_ROUTES
        .iter()
        .any(|guest| route == *guest || route.starts_with(&format!("{guest}/")))
}

/// Strips the query string, fragment and trailing slash.
fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_is_skipped_for_unauthenticated_endpoints() {
        assert!(skips_refresh("/auth/admin/login"));
        assert!(skips_refresh("/auth/admin/refresh"));
        assert!(skips_refresh("/auth/admin/forgot-password"));
        assert!(skips_refresh("/auth/admin/set-password/"));
        assert!(skips_refresh("/auth/admin/login?next=/merchants"));
        assert!(skips_refresh(endpoints::VERIFY_ACTION_MFA));
    }

    #[test]
    fn refresh_applies_to_protected_endpoints() {
        assert!(!skips_refresh("/admin/kyc/1/approve"));
        assert!(!skips_refresh(endpoints::LOGOUT));
        assert!(!skips_refresh("/auth/admin/login-history"));
    }

    #[test]
    fn guest_routes_match_nested_paths() {
        assert!(is_guest_route("/login"));
        assert!(is_guest_route("/set-password/abc123"));
        assert!(is_guest_route("/reset-password?token=1"));
        assert!(!is_guest_route("/"));
        assert!(!is_guest_route("/login-history"));
        assert!(!is_guest_route("/dashboard"));
    }
}
