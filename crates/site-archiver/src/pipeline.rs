use std::path::{Path, PathBuf};

use crate::browser::{PageLoader, PageRenderer};
use crate::config::{Config, OutputConfig};
use crate::crawler::{CrawlStats, Crawler};
use crate::error::Error;
use crate::ghostscript::{Compressor, DocumentComposer};
use crate::page::{PagePath, RenderArtifact};
use crate::renderer::RenderDriver;
use crate::sequencer;

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub crawl: CrawlStats,
    pub pages_rendered: usize,
    pub skipped: Vec<(PagePath, String)>,
    /// Absent when no page rendered and nothing was written.
    pub output: Option<PathBuf>,
    pub compressed: bool,
}

/// Discovers, orders, renders and binds the site into `config.output.path`.
///
/// `discovery` and `printing` are two contexts of the same browser; each is
/// used by one stage only.
pub async fn run<D, R>(
    config: &Config,
    discovery: &mut D,
    printing: &mut R,
    composer: &dyn DocumentComposer,
    compressor: Option<&dyn Compressor>,
) -> Result<PipelineReport, Error>
where
    D: PageLoader + ?Sized,
    R: PageLoader + PageRenderer + ?Sized,
{
    config.validate()?;

    let mut crawler = Crawler::new(config.site.base_url.clone(), config.crawl.clone());
    let discovered = crawler.discover(discovery, &config.site.seeds).await;

    let ordered = sequencer::order(discovered);
    tracing::info!("Ordered {} pages", ordered.len());

    let render = RenderDriver::new(&config.site.base_url, &config.render)
        .render(printing, &ordered)
        .await;

    let mut report = PipelineReport {
        crawl: crawler.into_stats(),
        skipped: render
            .skipped()
            .map(|(path, reason)| (path.clone(), reason.to_string()))
            .collect(),
        ..Default::default()
    };

    let artifacts = render.into_artifacts();
    report.pages_rendered = artifacts.len();

    if artifacts.is_empty() {
        tracing::warn!("No pages rendered, nothing to write");
        return Ok(report);
    }

    report.compressed = write_output(&config.output, &artifacts, composer, compressor).await?;
    report.output = Some(config.output.path.clone());
    Ok(report)
}

/// Composes the document and, when enabled, compresses it. A failed
/// compression still leaves the uncompressed document at the output path.
async fn write_output(
    config: &OutputConfig,
    artifacts: &[RenderArtifact],
    composer: &dyn DocumentComposer,
    compressor: Option<&dyn Compressor>,
) -> Result<bool, Error> {
    if let Some(parent) = config.path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| io_error(parent, source))?;
    }

    let compressor = match (config.compress, compressor) {
        (true, Some(compressor)) => compressor,
        (true, None) => {
            tracing::info!("No compressor available, writing uncompressed document");
            composer.compose(artifacts, &config.path).await?;
            return Ok(false);
        }
        (false, _) => {
            composer.compose(artifacts, &config.path).await?;
            tracing::info!("Saved {:?}", config.path);
            return Ok(false);
        }
    };

    let raw_path = config.raw_path();
    composer.compose(artifacts, &raw_path).await?;

    match compressor.compress(&raw_path, &config.path).await {
        Ok(()) => {
            tokio::fs::remove_file(&raw_path)
                .await
                .map_err(|source| io_error(&raw_path, source))?;
            tracing::info!("Saved compressed {:?}", config.path);
            Ok(true)
        }
        Err(e) => {
            tracing::warn!("Compression failed: {}", e);
            tokio::fs::rename(&raw_path, &config.path)
                .await
                .map_err(|source| io_error(&raw_path, source))?;
            tracing::warn!("Saved uncompressed {:?} instead", config.path);
            Ok(false)
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source,
    }
}
