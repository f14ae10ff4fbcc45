use clap::Parser;
use miette::IntoDiagnostic;
use site_archiver::browser::BrowserSession;
use site_archiver::config::Config;
use site_archiver::ghostscript::{Compressor, Ghostscript};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Crawl a running website and bind every page into one archival PDF.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct CliArgs {
    /// Base URL of the site to archive. Overrides the config file.
    url: Option<Url>,
    /// TOML file with the full configuration.
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Output PDF file.
    #[clap(short, long)]
    output: Option<PathBuf>,
    /// Crawl bibliography ("sources") pages too.
    #[clap(long)]
    include_sources: bool,
    /// Skip the Ghostscript compression step.
    #[clap(long)]
    no_compress: bool,
    /// Stop discovery after this many pages have been loaded.
    #[clap(long)]
    max_pages: Option<usize>,
    /// Attach to a running browser (DevTools websocket URL) instead of launching one.
    #[clap(short = 'W', long, value_name = "WEBSOCKET_URL")]
    websocket_url: Option<String>,
    /// Log filter used when RUST_LOG is not set.
    #[clap(long, default_value = "info")]
    log_level: String,
    /// Log output format.
    #[clap(long, value_enum, default_value_t)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum LogFormat {
    #[default]
    Text,
    Json,
}

impl CliArgs {
    fn into_config(self) -> miette::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(url) = self.url {
            config.site.base_url = url;
        }
        if let Some(output) = self.output {
            config.output.path = output;
        }
        if self.include_sources {
            config.crawl.skip_sources = false;
        }
        if self.no_compress {
            config.output.compress = false;
        }
        if self.max_pages.is_some() {
            config.crawl.max_pages = self.max_pages;
        }
        if self.websocket_url.is_some() {
            config.browser.websocket_url = self.websocket_url;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(level: &str, format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_level, args.log_format);

    let config = args.into_config()?;
    tracing::info!("Archiving {} into {:?}", config.site.base_url, config.output.path);

    let session = BrowserSession::launch(&config.browser, &config.render).await?;
    let result = async {
        let mut discovery = session.new_page(None).await?;
        let mut printing = session.new_page(Some(config.render.viewport())).await?;
        let gs = Ghostscript::new(&config.output.ghostscript);

        site_archiver::pipeline::run(
            &config,
            &mut discovery,
            &mut printing,
            &gs,
            Some(&gs as &dyn Compressor),
        )
        .await
    }
    .await;
    session.close().await;

    let report = result?;
    report.crawl.write_stats_to_stderr();
    for (path, reason) in &report.skipped {
        tracing::warn!("Not printed: {} ({})", path, reason);
    }

    match report.output {
        Some(path) => {
            let path = path.canonicalize().into_diagnostic()?;
            tracing::info!(
                "Done: {} pages in {:?}{}",
                report.pages_rendered,
                path,
                if report.compressed { " (compressed)" } else { "" }
            );
        }
        None => tracing::warn!("No pages were rendered; no output written"),
    }

    Ok(())
}
