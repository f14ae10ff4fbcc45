use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

use crate::classify;

/// A site-relative path with trailing slashes removed (except for the root).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PagePath(String);

impl PagePath {
    pub const ROOT: &'static str = "/";

    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim_end_matches('/');
        if trimmed.is_empty() {
            Self(Self::ROOT.to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }
}

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Core,
    Book,
    Blog,
    Misc,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Core => write!(f, "core"),
            Category::Book => write!(f, "book"),
            Category::Blog => write!(f, "blog"),
            Category::Misc => write!(f, "misc"),
        }
    }
}

/// A page found during discovery. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    pub path: PagePath,
    pub category: Category,
    pub published_at: Option<DateTime<Utc>>,
}

impl PageDescriptor {
    pub fn new(path: PagePath, published_at: Option<DateTime<Utc>>) -> Self {
        let category = classify::classify(path.as_str());
        Self {
            path,
            category,
            published_at,
        }
    }
}

/// Rendered bytes of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderArtifact {
    pub path: PagePath,
    pub bytes: Vec<u8>,
}

/// Parses a publication date as found in `<time datetime>` or
/// `article:published_time`. Bare dates are taken as midnight UTC.
pub fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
