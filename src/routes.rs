use crate::profile::{ROLE_ADMIN, ROLE_USER};

/// Navigation targets exposed by the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    AdminDashboard,
    UserDashboard,
    UserProfile,
    Unauthorized,
}

impl Route {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().trim_end_matches('/') {
            "/auth/login" | "login" => Some(Self::Login),
            "/admin/dashboard" | "admin" => Some(Self::AdminDashboard),
            "/user/dashboard" | "dashboard" => Some(Self::UserDashboard),
            "/user/profile" | "profile" => Some(Self::UserProfile),
            "/dashboard-unauthorized" => Some(Self::Unauthorized),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/auth/login",
            Self::AdminDashboard => "/admin/dashboard",
            Self::UserDashboard => "/user/dashboard",
            Self::UserProfile => "/user/profile",
            Self::Unauthorized => "/dashboard-unauthorized",
        }
    }

    /// Role a session must carry to enter this route, if any.
    /// `None` on a protected route means any logged-in session is enough.
    pub fn required_role(&self) -> Option<&'static str> {
        match self {
            Self::AdminDashboard => Some(ROLE_ADMIN),
            Self::UserDashboard => Some(ROLE_USER),
            _ => None,
        }
    }

    /// Public routes bypass the guard entirely.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Login | Self::Unauthorized)
    }

    pub fn all() -> [Route; 5] {
        [
            Self::Login,
            Self::AdminDashboard,
            Self::UserDashboard,
            Self::UserProfile,
            Self::Unauthorized,
        ]
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paths() {
        assert_eq!(Route::parse("/auth/login"), Some(Route::Login));
        assert_eq!(Route::parse("/admin/dashboard"), Some(Route::AdminDashboard));
        assert_eq!(Route::parse("/user/dashboard"), Some(Route::UserDashboard));
        assert_eq!(Route::parse("/user/profile"), Some(Route::UserProfile));
        assert_eq!(
            Route::parse("/dashboard-unauthorized"),
            Some(Route::Unauthorized)
        );
        assert_eq!(Route::parse("/nope"), None);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Route::parse("admin"), Some(Route::AdminDashboard));
        assert_eq!(Route::parse("dashboard"), Some(Route::UserDashboard));
        assert_eq!(Route::parse(" profile "), Some(Route::UserProfile));
        assert_eq!(Route::parse("/user/dashboard/"), Some(Route::UserDashboard));
    }

    #[test]
    fn test_access_requirements() {
        assert!(Route::Login.is_public());
        assert!(Route::Unauthorized.is_public());
        assert_eq!(Route::AdminDashboard.required_role(), Some("admin"));
        assert_eq!(Route::UserDashboard.required_role(), Some("user"));
        assert_eq!(Route::UserProfile.required_role(), None);
        assert!(!Route::UserProfile.is_public());
    }

    #[test]
    fn test_display_round_trip() {
        for route in Route::all() {
            assert_eq!(Route::parse(route.path()), Some(route));
        }
    }
}
