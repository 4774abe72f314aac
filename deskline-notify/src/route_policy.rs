/// Decides whether toasts may be shown on a given route.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    public_prefixes: Vec<String>,
}

const LOGIN_ROUTE: &str = "/login";

impl RoutePolicy {
    pub fn new(public_prefixes: Vec<String>) -> Self {
        Self { public_prefixes }
    }

    /// Toasts need an authenticated user on an app route: not the login page,
    /// not a public form, not the bare root.
    pub fn allows(&self, route: &str, authenticated: bool) -> bool {
        if !authenticated {
            return false;
        }

        let path = route.split(['?', '#']).next().unwrap_or(route);
        if path.is_empty() || path == "/" {
            return false;
        }
        if matches_prefix(path, LOGIN_ROUTE) {
            return false;
        }

        !self
            .public_prefixes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::new(vec!["/public".into(), "/forms/external".into()])
    }
}

/// Segment-aware prefix match: `/public` covers `/public/x` but not `/publications`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
