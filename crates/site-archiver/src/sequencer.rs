//! Archival order of discovered pages.
//!
//! Landing page first, then the other core pages, books, blog posts from
//! newest to oldest, and everything else. The order only depends on the
//! descriptors, never on discovery order.

use icu_collator::{Collator, CollatorOptions};
use std::cmp::Ordering;

use crate::page::{Category, PageDescriptor};

pub fn order(descriptors: Vec<PageDescriptor>) -> Vec<PageDescriptor> {
    let collator = PathCollator::new();
    let mut home = None;
    let mut core = Vec::new();
    let mut books = Vec::new();
    let mut blog = Vec::new();
    let mut misc = Vec::new();

    for descriptor in descriptors {
        let category = descriptor.category;
        match category {
            Category::Core if descriptor.path.is_root() && home.is_none() => {
                home = Some(descriptor)
            }
            Category::Core => core.push(descriptor),
            Category::Book => books.push(descriptor),
            Category::Blog => blog.push(descriptor),
            Category::Misc => misc.push(descriptor),
        }
    }

    core.sort_by(|a, b| collator.by_path(a, b));
    books.sort_by(|a, b| collator.by_path(a, b));
    blog.sort_by(|a, b| collator.by_date_desc(a, b));
    misc.sort_by(|a, b| collator.by_path(a, b));

    home.into_iter()
        .chain(core)
        .chain(books)
        .chain(blog)
        .chain(misc)
        .collect()
}

/// Root-locale (CLDR) collation at tertiary strength: punctuation before
/// digits before letters, lower case before upper case. Strings that
/// collate equal are ordered by code point.
pub struct PathCollator {
    collator: Collator,
}

impl PathCollator {
    pub fn new() -> Self {
        let collator = Collator::try_new(&Default::default(), CollatorOptions::new())
            .expect("compiled root collation data is available");
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.collator.compare(a, b).then_with(|| a.cmp(b))
    }

    fn by_path(&self, a: &PageDescriptor, b: &PageDescriptor) -> Ordering {
        self.compare(a.path.as_str(), b.path.as_str())
    }

    /// Dated posts newest first, undated posts after them by path. Equal
    /// dates fall back to the path.
    fn by_date_desc(&self, a: &PageDescriptor, b: &PageDescriptor) -> Ordering {
        match (a.published_at, b.published_at) {
            (Some(date_a), Some(date_b)) => {
                date_b.cmp(&date_a).then_with(|| self.by_path(a, b))
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.by_path(a, b),
        }
    }
}

impl Default for PathCollator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    PathCollator::new().compare(a, b)
}
