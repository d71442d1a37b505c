//! Client locations and the static route table.
//!
//! Route metadata is fixed at construction; the navigation guard is its only
//! reader. Matching uses the path alone: query strings and fragments are
//! carried through but never affect which route a location resolves to.

use std::fmt;

use url::form_urlencoded;

/// Root route.
pub const ROOT_PATH: &str = "/";
/// Login route; the auth redirect target.
pub const LOGIN_PATH: &str = "/login";
/// Password-update route admitted regardless of session state.
pub const UPDATE_PASSWORD_PATH: &str = "/update-password";
/// Query parameter telling the login view why the user was sent there.
pub const REDIRECT_PARAM: &str = "redirect";

/// Validation errors raised by [`Location::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// The target was empty.
    #[error("location must not be empty")]
    Empty,
    /// The target was not an absolute in-app path.
    #[error("location `{0}` must start with `/`")]
    NotAbsolute(String),
}

/// An in-app location: path, query pairs and optional fragment.
///
/// # Examples
/// ```
/// use client::domain::Location;
///
/// let location = Location::parse("/login?redirect=auth_required#form").unwrap();
/// assert_eq!(location.path(), "/login");
/// assert_eq!(location.query_value("redirect"), Some("auth_required"));
/// assert_eq!(location.to_string(), "/login?redirect=auth_required#form");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    path: String,
    query: Vec<(String, String)>,
    fragment: Option<String>,
}

impl Location {
    /// The root location `/`.
    pub fn root() -> Self {
        Self::from_path(ROOT_PATH)
    }

    /// A location with no query or fragment. `path` is used verbatim.
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            fragment: None,
        }
    }

    /// Parse an in-app target such as `/profile?tab=orders#top`.
    pub fn parse(target: &str) -> Result<Self, LocationError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(LocationError::Empty);
        }
        if !target.starts_with('/') {
            return Err(LocationError::NotAbsolute(target.to_owned()));
        }

        let (rest, fragment) = match target.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_owned())),
            None => (target, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (
                path,
                form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect(),
            ),
            None => (rest, Vec::new()),
        };

        Ok(Self {
            path: path.to_owned(),
            query,
            fragment,
        })
    }

    /// Append a query pair.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Raw path component.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path used for route matching: a trailing slash is dropped except on
    /// the root.
    pub fn route_path(&self) -> &str {
        let trimmed = self.path.trim_end_matches('/');
        if trimmed.is_empty() { ROOT_PATH } else { trimmed }
    }

    /// First value of query parameter `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Fragment without the leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.query.iter())
                .finish();
            write!(f, "?{encoded}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

/// Access requirements declared by a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteRequirement {
    /// Only signed-in sessions may enter.
    pub requires_auth: bool,
    /// Only administrators may enter.
    pub requires_admin: bool,
}

impl RouteRequirement {
    /// Open to everyone.
    pub const NONE: Self = Self {
        requires_auth: false,
        requires_admin: false,
    };
    /// Signed-in sessions only.
    pub const AUTH: Self = Self {
        requires_auth: true,
        requires_admin: false,
    };
    /// Signed-in administrators only.
    pub const ADMIN: Self = Self {
        requires_auth: true,
        requires_admin: true,
    };
}

/// A named route and its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    /// Route path, e.g. `/profile`.
    pub path: &'static str,
    /// Route name used by views.
    pub name: &'static str,
    /// Access requirements.
    pub requirement: RouteRequirement,
    /// Admitted before any requirement is checked.
    pub bypass: bool,
}

impl RouteDefinition {
    const fn new(path: &'static str, name: &'static str, requirement: RouteRequirement) -> Self {
        Self {
            path,
            name,
            requirement,
            bypass: false,
        }
    }
}

/// Immutable set of route definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
}

impl RouteTable {
    /// Build a table from explicit definitions.
    pub fn new(routes: Vec<RouteDefinition>) -> Self {
        Self { routes }
    }

    /// Routes of the materials marketplace.
    pub fn marketplace() -> Self {
        Self::new(vec![
            RouteDefinition::new(ROOT_PATH, "home", RouteRequirement::NONE),
            RouteDefinition::new("/pbr", "pbr", RouteRequirement::NONE),
            RouteDefinition::new("/signup", "signup", RouteRequirement::NONE),
            RouteDefinition::new("/profile", "profile", RouteRequirement::AUTH),
            RouteDefinition::new(LOGIN_PATH, "login", RouteRequirement::NONE),
            RouteDefinition::new("/contact", "contact", RouteRequirement::NONE),
            RouteDefinition::new("/admin", "admin", RouteRequirement::ADMIN),
            RouteDefinition {
                bypass: true,
                ..RouteDefinition::new(
                    UPDATE_PASSWORD_PATH,
                    "update-password",
                    RouteRequirement::NONE,
                )
            },
        ])
    }

    /// Definition matching `location`, if any.
    pub fn resolve(&self, location: &Location) -> Option<&RouteDefinition> {
        let path = location.route_path();
        self.routes.iter().find(|route| route.path == path)
    }

    /// Requirements for `location`; unknown paths have none.
    pub fn requirement_for(&self, location: &Location) -> RouteRequirement {
        self.resolve(location)
            .map(|route| route.requirement)
            .unwrap_or_default()
    }

    /// Whether `location` skips all requirement checks.
    pub fn is_bypass(&self, location: &Location) -> bool {
        self.resolve(location).is_some_and(|route| route.bypass)
    }

    /// All definitions in declaration order.
    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/", RouteRequirement::NONE)]
    #[case("/pbr", RouteRequirement::NONE)]
    #[case("/profile", RouteRequirement::AUTH)]
    #[case("/profile/", RouteRequirement::AUTH)]
    #[case("/profile?tab=orders", RouteRequirement::AUTH)]
    #[case("/admin#users", RouteRequirement::ADMIN)]
    #[case("/does-not-exist", RouteRequirement::NONE)]
    fn requirements_follow_the_path(#[case] target: &str, #[case] expected: RouteRequirement) {
        let table = RouteTable::marketplace();
        let location = Location::parse(target).expect("valid target");
        assert_eq!(table.requirement_for(&location), expected);
    }

    #[rstest]
    #[case("/update-password", true)]
    #[case("/update-password?type=recovery", true)]
    #[case("/login", false)]
    fn only_password_update_bypasses(#[case] target: &str, #[case] expected: bool) {
        let table = RouteTable::marketplace();
        let location = Location::parse(target).expect("valid target");
        assert_eq!(table.is_bypass(&location), expected);
    }

    #[rstest]
    #[case("", LocationError::Empty)]
    #[case("profile", LocationError::NotAbsolute("profile".to_owned()))]
    #[case("https://evil.example/", LocationError::NotAbsolute("https://evil.example/".to_owned()))]
    fn relative_targets_are_rejected(#[case] target: &str, #[case] expected: LocationError) {
        assert_eq!(Location::parse(target), Err(expected));
    }

    #[rstest]
    fn query_values_are_decoded_and_reencoded() {
        let location = Location::parse("/pbr?q=oak+planks&tag=a%26b").expect("valid target");
        assert_eq!(location.query_value("q"), Some("oak planks"));
        assert_eq!(location.query_value("tag"), Some("a&b"));
        assert_eq!(location.to_string(), "/pbr?q=oak+planks&tag=a%26b");
    }

    #[rstest]
    fn login_redirect_renders_reason() {
        let location = Location::from_path(LOGIN_PATH).with_query(REDIRECT_PARAM, "auth_required");
        assert_eq!(location.to_string(), "/login?redirect=auth_required");
    }
}
