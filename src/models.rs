use serde::{Deserialize, Serialize};

/// Marker stored in `GradeItem::max` when the portal shows no range for an item.
pub const NO_MAX: &str = "NA";

// Held for a single login attempt only, never serialized.
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Value of the portal's session cookie. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(SessionToken(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub type CourseId = String;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GradeItem {
    pub name: String,
    pub grade: String,
    pub max: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub items: Vec<GradeItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ScrapeResult {
    pub courses: Vec<Course>,
}

/// A grade that appeared or changed since a previous export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeDiff {
    pub course: String,
    pub name: String,
    pub previous: Option<String>,
    pub grade: String,
}
