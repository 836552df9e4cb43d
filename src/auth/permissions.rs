/// Permission Registry
///
/// A static, read-only table mapping (HTTP method, route pattern) to the
/// permission required to call it. An empty permission string means "any
/// authenticated caller"; a route with no entry is implicitly denied by the
/// middleware (fail-closed). Built once and injected at construction, so
/// tests can supply their own table.

use std::collections::HashMap;

use actix_web::http::Method;

#[derive(Debug, Clone, Default)]
pub struct PermissionRegistry {
    routes: HashMap<Method, HashMap<String, String>>,
}

impl PermissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route pattern (as actix writes it, e.g. `/users/{id}`).
    pub fn register(
        mut self,
        method: Method,
        pattern: impl Into<String>,
        permission: impl Into<String>,
    ) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(pattern.into(), permission.into());
        self
    }

    /// Look up the permission required for a route.
    ///
    /// `None` means the route is not registered; callers must treat that as
    /// a denial, never as "unrestricted".
    pub fn required(&self, method: &Method, pattern: &str) -> Option<&str> {
        self.routes
            .get(method)
            .and_then(|by_pattern| by_pattern.get(pattern))
            .map(String::as_str)
    }

    /// The production table for the protected user-management routes.
    ///
    /// Unauthenticated routes (health, login, request-password-reset) and the
    /// reset-token route are wired outside the permission middleware and do
    /// not appear here.
    pub fn standard() -> Self {
        Self::new()
            .register(Method::GET, "/users/me", "")
            .register(Method::POST, "/users", "")
            .register(Method::POST, "/users/change-password", "")
            .register(Method::DELETE, "/users/{id}", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_route_returns_permission() {
        let registry =
            PermissionRegistry::new().register(Method::DELETE, "/users/{id}", "delete-user");

        assert_eq!(
            registry.required(&Method::DELETE, "/users/{id}"),
            Some("delete-user")
        );
    }

    #[test]
    fn test_empty_permission_is_preserved() {
        let registry = PermissionRegistry::standard();

        assert_eq!(registry.required(&Method::GET, "/users/me"), Some(""));
    }

    #[test]
    fn test_unregistered_route_is_none() {
        let registry = PermissionRegistry::standard();

        assert_eq!(registry.required(&Method::GET, "/admin"), None);
        // same pattern, different method
        assert_eq!(registry.required(&Method::PUT, "/users/me"), None);
    }
}
