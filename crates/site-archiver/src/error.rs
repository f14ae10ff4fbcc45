use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    #[diagnostic(
        code(site_archiver::browser::launch),
        help("Make sure Chrome or Chromium is installed, or pass --websocket-url to attach to a running instance.")
    )]
    Launch(String),

    #[error("Failed to navigate to {url}: {message}")]
    #[diagnostic(code(site_archiver::browser::navigation))]
    Navigation { url: String, message: String },

    #[error("Navigation to {url} timed out after {timeout_ms}ms")]
    #[diagnostic(code(site_archiver::browser::timeout))]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Script evaluation failed: {0}")]
    #[diagnostic(code(site_archiver::browser::script))]
    Script(String),

    #[error("Failed to render page: {0}")]
    #[diagnostic(code(site_archiver::browser::render))]
    Render(String),
}

#[derive(Debug, Error, Diagnostic)]
pub enum ComposeError {
    #[error("Failed to run {program}: {source}")]
    #[diagnostic(
        code(site_archiver::ghostscript::spawn),
        help("Is Ghostscript installed and on PATH?")
    )]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    #[diagnostic(code(site_archiver::ghostscript::status))]
    ExitStatus { program: String, status: String },

    #[error("Nothing to compose")]
    #[diagnostic(code(site_archiver::ghostscript::empty))]
    Empty,

    #[error("I/O error while composing {path:?}: {source}")]
    #[diagnostic(code(site_archiver::ghostscript::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    #[diagnostic(code(site_archiver::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {message}")]
    #[diagnostic(code(site_archiver::config::parse))]
    Parse { path: PathBuf, message: String },

    #[error("Base URL '{0}' cannot be used as a base for site paths")]
    #[diagnostic(
        code(site_archiver::config::base_url),
        help("Use an absolute http(s) URL such as http://localhost:4321")
    )]
    InvalidBaseUrl(String),

    #[error("At least one seed path is required")]
    #[diagnostic(code(site_archiver::config::seeds))]
    NoSeeds,
}

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("File operation on {path:?} failed: {source}")]
    #[diagnostic(code(site_archiver::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
