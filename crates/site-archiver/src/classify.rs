//! Path predicates used to prune the crawl frontier and bucket pages.
//!
//! Every function here looks at the path string only.

use crate::page::Category;

const BOOKS_PREFIX: &str = "/books/";
const BLOG_PREFIX: &str = "/blog/";
const CORE_PREFIXES: [&str; 2] = ["/about", "/contact"];

/// Tag, category and blog series listings. These duplicate content reachable
/// from the pages themselves and are never crawled.
pub fn is_taxonomy(path: &str) -> bool {
    path.contains("/tag/")
        || path.contains("/category/")
        || (path.contains("/series/") && path.contains(BLOG_PREFIX))
}

/// The paginated blog index. Crawled for links, never rendered.
pub fn is_list_page(path: &str) -> bool {
    path == "/blog" || path.contains("/blog/page/")
}

pub fn is_source_page(path: &str) -> bool {
    path.contains("/sources")
}

pub fn classify(path: &str) -> Category {
    if path.starts_with(BOOKS_PREFIX) {
        Category::Book
    } else if path.starts_with(BLOG_PREFIX) {
        Category::Blog
    } else if path == "/" || CORE_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        Category::Core
    } else {
        Category::Misc
    }
}
