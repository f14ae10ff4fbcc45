use url::Url;

use crate::browser::{PageLoader, PageRenderer};
use crate::config::RenderConfig;
use crate::error::BrowserError;
use crate::page::{PageDescriptor, PagePath, RenderArtifact};

#[derive(Debug)]
pub enum RenderOutcome {
    Rendered(RenderArtifact),
    Skipped { path: PagePath, reason: String },
}

/// Outcomes in the order the pages were given.
#[derive(Debug, Default)]
pub struct RenderReport {
    pub outcomes: Vec<RenderOutcome>,
}

impl RenderReport {
    pub fn rendered(&self) -> usize {
        self.artifacts().count()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &RenderArtifact> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            RenderOutcome::Rendered(artifact) => Some(artifact),
            RenderOutcome::Skipped { .. } => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&PagePath, &str)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            RenderOutcome::Skipped { path, reason } => Some((path, reason.as_str())),
            RenderOutcome::Rendered(_) => None,
        })
    }

    pub fn into_artifacts(self) -> Vec<RenderArtifact> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                RenderOutcome::Rendered(artifact) => Some(artifact),
                RenderOutcome::Skipped { .. } => None,
            })
            .collect()
    }
}

pub struct RenderDriver<'a> {
    base_url: &'a Url,
    config: &'a RenderConfig,
}

impl<'a> RenderDriver<'a> {
    pub fn new(base_url: &'a Url, config: &'a RenderConfig) -> Self {
        Self { base_url, config }
    }

    /// Renders the pages one after another on the same page context.
    pub async fn render<P>(&self, page: &mut P, ordered: &[PageDescriptor]) -> RenderReport
    where
        P: PageLoader + PageRenderer + ?Sized,
    {
        tracing::info!("Printing {} pages", ordered.len());
        let mut report = RenderReport::default();

        for (index, descriptor) in ordered.iter().enumerate() {
            tracing::info!("[{}/{}] {}", index + 1, ordered.len(), descriptor.path);

            let outcome = match self.render_page(page, &descriptor.path).await {
                Ok(bytes) => RenderOutcome::Rendered(RenderArtifact {
                    path: descriptor.path.clone(),
                    bytes,
                }),
                Err(e) => {
                    tracing::error!("Failed to print {}: {}", descriptor.path, e);
                    RenderOutcome::Skipped {
                        path: descriptor.path.clone(),
                        reason: e.to_string(),
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        report
    }

    async fn render_page<P>(&self, page: &mut P, path: &PagePath) -> Result<Vec<u8>, BrowserError>
    where
        P: PageLoader + PageRenderer + ?Sized,
    {
        let url = self
            .base_url
            .join(path.as_str())
            .map_err(|e| BrowserError::Navigation {
                url: path.to_string(),
                message: e.to_string(),
            })?;

        page.load(&url).await?;

        if page
            .click_button_matching(&self.config.expand_phrases)
            .await?
        {
            tracing::debug!("Expanded collapsed content on {}", path);
            tokio::time::sleep(self.config.settle_delay()).await;
        }

        self.scroll_to_bottom(page).await?;
        tokio::time::sleep(self.config.settle_delay()).await;

        page.inject_banner(&banner_text(path, &self.config.banner_label))
            .await?;
        page.render(&self.config.layout).await
    }

    /// Scrolls in fixed steps until the distance covered reaches the bottom
    /// of the document, so lazy content gets a chance to load.
    async fn scroll_to_bottom<P>(&self, page: &mut P) -> Result<(), BrowserError>
    where
        P: PageLoader + PageRenderer + ?Sized,
    {
        let step = self.config.scroll_step_px.max(1);
        let mut scrolled: u64 = 0;

        loop {
            let metrics = page.scroll_by(step).await?;
            scrolled += u64::from(step);
            if scrolled >= metrics.scroll_height.saturating_sub(metrics.viewport_height) {
                return Ok(());
            }
            tokio::time::sleep(self.config.scroll_interval()).await;
        }
    }
}

pub fn banner_text(path: &PagePath, label: &str) -> String {
    format!("SLUG: {} | {}", path, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::ScrollMetrics;
    use crate::config::PageLayout;
    use async_trait::async_trait;
    use std::collections::HashSet;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Stage {
        Load,
        Expand,
        Banner,
        Render,
    }

    /// Fake page: every page is `height` pixels tall; pages listed in
    /// `failures` break at the given stage.
    #[derive(Default)]
    struct FakePage {
        height: u64,
        expandable: HashSet<String>,
        failures: Vec<(String, Stage)>,
        current: String,
        scrolls: Vec<(String, u32)>,
        expanded: Vec<String>,
        banners: Vec<String>,
    }

    impl FakePage {
        fn fails(&self, stage: Stage) -> Result<(), BrowserError> {
            if self
                .failures
                .iter()
                .any(|(path, failing)| *path == self.current && *failing == stage)
            {
                Err(BrowserError::Script(format!("{:?} failed on {}", stage, self.current)))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl PageLoader for FakePage {
        async fn load(&mut self, url: &Url) -> Result<Url, BrowserError> {
            self.current = url.path().to_string();
            self.fails(Stage::Load).map(|()| url.clone())
        }

        async fn html(&mut self) -> Result<String, BrowserError> {
            Ok(String::new())
        }

        async fn click_button_matching(&mut self, phrases: &[String]) -> Result<bool, BrowserError> {
            self.fails(Stage::Expand)?;
            assert!(phrases.contains(&"expand all".to_string()));
            if self.expandable.contains(&self.current) {
                self.expanded.push(self.current.clone());
                Ok(true)
            } else {
                Ok(false)
            }
        }

        async fn scroll_by(&mut self, distance: u32) -> Result<ScrollMetrics, BrowserError> {
            self.scrolls.push((self.current.clone(), distance));
            Ok(ScrollMetrics {
                scroll_height: self.height,
                viewport_height: 1600,
            })
        }

        async fn inject_banner(&mut self, text: &str) -> Result<(), BrowserError> {
            self.fails(Stage::Banner)?;
            self.banners.push(text.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl PageRenderer for FakePage {
        async fn render(&mut self, layout: &PageLayout) -> Result<Vec<u8>, BrowserError> {
            self.fails(Stage::Render)?;
            assert!(layout.print_background);
            Ok(format!("%PDF {}", self.current).into_bytes())
        }
    }

    fn instant_config() -> RenderConfig {
        RenderConfig {
            settle_delay_ms: 0,
            scroll_interval_ms: 0,
            ..Default::default()
        }
    }

    fn descriptors(paths: &[&str]) -> Vec<PageDescriptor> {
        paths
            .iter()
            .map(|path| PageDescriptor::new(PagePath::new(path), None))
            .collect()
    }

    fn base() -> Url {
        Url::parse("http://localhost:4321").unwrap()
    }

    #[tokio::test]
    async fn test_render_all_pages_in_order() {
        let config = instant_config();
        let base = base();
        let mut page = FakePage {
            height: 1600,
            ..Default::default()
        };

        let report = RenderDriver::new(&base, &config)
            .render(&mut page, &descriptors(&["/", "/about", "/blog/post"]))
            .await;

        let artifacts = report.into_artifacts();
        let rendered: Vec<&str> = artifacts.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(rendered, vec!["/", "/about", "/blog/post"]);
        assert_eq!(artifacts[1].bytes, b"%PDF /about".to_vec());
        assert_eq!(
            page.banners,
            vec![
                "SLUG: / | SITE ARCHIVE (BACKUP)",
                "SLUG: /about | SITE ARCHIVE (BACKUP)",
                "SLUG: /blog/post | SITE ARCHIVE (BACKUP)",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_pages_are_omitted_not_reordered() {
        let config = instant_config();
        let base = base();
        let mut page = FakePage {
            height: 1600,
            failures: vec![
                ("/a".to_string(), Stage::Load),
                ("/c".to_string(), Stage::Render),
                ("/d".to_string(), Stage::Banner),
                ("/f".to_string(), Stage::Expand),
            ],
            ..Default::default()
        };
        let input = descriptors(&["/a", "/b", "/c", "/d", "/e", "/f"]);

        let report = RenderDriver::new(&base, &config)
            .render(&mut page, &input)
            .await;

        assert_eq!(report.outcomes.len(), input.len());
        assert_eq!(report.rendered(), 2);
        let skipped: Vec<&str> = report.skipped().map(|(path, _)| path.as_str()).collect();
        assert_eq!(skipped, vec!["/a", "/c", "/d", "/f"]);

        let rendered: Vec<&str> = report.artifacts().map(|a| a.path.as_str()).collect();
        assert_eq!(rendered, vec!["/b", "/e"]);
        assert!(rendered.len() <= input.len());
    }

    #[tokio::test]
    async fn test_scrolls_until_bottom() {
        let config = instant_config();
        let base = base();
        let mut page = FakePage {
            height: 1600 + 450,
            ..Default::default()
        };

        RenderDriver::new(&base, &config)
            .render(&mut page, &descriptors(&["/long"]))
            .await;

        assert_eq!(page.scrolls.len(), 5);
        assert!(page.scrolls.iter().all(|(path, step)| path == "/long" && *step == 100));
    }

    #[tokio::test]
    async fn test_short_page_scrolls_once() {
        let config = instant_config();
        let base = base();
        let mut page = FakePage {
            height: 800,
            ..Default::default()
        };

        RenderDriver::new(&base, &config)
            .render(&mut page, &descriptors(&["/short"]))
            .await;

        assert_eq!(page.scrolls.len(), 1);
    }

    #[tokio::test]
    async fn test_expands_only_pages_with_matching_button() {
        let config = instant_config();
        let base = base();
        let mut page = FakePage {
            height: 1600,
            expandable: HashSet::from(["/books/dune".to_string()]),
            ..Default::default()
        };

        let report = RenderDriver::new(&base, &config)
            .render(&mut page, &descriptors(&["/", "/books/dune"]))
            .await;

        assert_eq!(report.rendered(), 2);
        assert_eq!(page.expanded, vec!["/books/dune"]);
    }

    #[test]
    fn test_banner_text() {
        assert_eq!(
            banner_text(&PagePath::new("/blog/post/"), "ARCHIVE"),
            "SLUG: /blog/post | ARCHIVE"
        );
    }
}
