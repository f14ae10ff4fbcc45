//! Website archiver that binds every reachable page of a site into one PDF.
//!
//! The crate crawls a running site breadth-first, orders the discovered pages
//! into a fixed archival sequence, renders each page through a headless browser
//! and concatenates the results into a single document, optionally compressed.
//!
//! # Features
//!
//! - Breadth-first discovery with path normalization and taxonomy filtering
//! - Deterministic ordering: landing pages, books, blog posts (newest first), the rest
//! - Content expansion and lazy-load scrolling before each page is printed
//! - Per-page failures are recorded and skipped, never fatal
//! - Document composition and compression through Ghostscript
//!
//! # Usage
//!
//! ```rust,ignore
//! use site_archiver::browser::BrowserSession;
//! use site_archiver::config::Config;
//! use site_archiver::ghostscript::Ghostscript;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), site_archiver::Error> {
//!     let config = Config::default();
//!     let session = BrowserSession::launch(&config.browser, &config.render).await?;
//!     let mut discovery = session.new_page(None).await?;
//!     let mut printing = session.new_page(Some(config.render.viewport())).await?;
//!     let gs = Ghostscript::new(&config.output.ghostscript);
//!     let report = site_archiver::pipeline::run(
//!         &config,
//!         &mut discovery,
//!         &mut printing,
//!         &gs,
//!         Some(&gs),
//!     )
//!     .await?;
//!     println!("Rendered {} pages", report.pages_rendered);
//!     Ok(())
//! }
//! ```
//!
//! # Capabilities
//!
//! The pipeline only talks to the outside world through the traits in
//! [`browser`] and [`ghostscript`], so every stage can run against fakes.
//!
pub mod browser;
pub mod classify;
pub mod config;
pub mod crawler;
pub mod error;
pub mod ghostscript;
pub mod page;
pub mod pipeline;
pub mod renderer;
pub mod sequencer;

pub use error::Error;
