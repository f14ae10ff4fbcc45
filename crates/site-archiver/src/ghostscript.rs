//! Document composer and compressor capabilities.
//!
//! [`Ghostscript`] implements both by shelling out to `gs` with the
//! `pdfwrite` device.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;

use crate::error::ComposeError;
use crate::page::RenderArtifact;

#[async_trait]
pub trait DocumentComposer: Send + Sync {
    /// Concatenates the artifacts, in order, into one document at `output`.
    async fn compose(&self, artifacts: &[RenderArtifact], output: &Path) -> Result<(), ComposeError>;
}

#[async_trait]
pub trait Compressor: Send + Sync {
    async fn compress(&self, input: &Path, output: &Path) -> Result<(), ComposeError>;
}

#[derive(Debug, Clone)]
pub struct Ghostscript {
    program: String,
}

impl Ghostscript {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    async fn run(&self, args: Vec<OsString>) -> Result<(), ComposeError> {
        tracing::debug!("Running {} {:?}", self.program, args);
        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .await
            .map_err(|source| ComposeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ComposeError::ExitStatus {
                program: self.program.clone(),
                status: status.to_string(),
            })
        }
    }
}

impl Default for Ghostscript {
    fn default() -> Self {
        Self::new("gs")
    }
}

fn output_arg(output: &Path) -> OsString {
    let mut arg = OsString::from("-sOutputFile=");
    arg.push(output);
    arg
}

fn compose_args(inputs: &[impl AsRef<Path>], output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-sDEVICE=pdfwrite", "-dNOPAUSE", "-dQUIET", "-dBATCH"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(output_arg(output));
    args.extend(inputs.iter().map(|input| input.as_ref().as_os_str().to_owned()));
    args
}

fn compress_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-sDEVICE=pdfwrite",
        "-dCompatibilityLevel=1.4",
        "-dPDFSETTINGS=/ebook",
        "-dNOPAUSE",
        "-dQUIET",
        "-dBATCH",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(output_arg(output));
    args.push(input.as_os_str().to_owned());
    args
}

#[async_trait]
impl DocumentComposer for Ghostscript {
    async fn compose(&self, artifacts: &[RenderArtifact], output: &Path) -> Result<(), ComposeError> {
        if artifacts.is_empty() {
            return Err(ComposeError::Empty);
        }

        let workdir = tempfile::tempdir().map_err(|source| ComposeError::Io {
            path: std::env::temp_dir(),
            source,
        })?;

        let mut inputs = Vec::with_capacity(artifacts.len());
        for (index, artifact) in artifacts.iter().enumerate() {
            let path = workdir.path().join(format!("{:05}.pdf", index));
            tokio::fs::write(&path, &artifact.bytes)
                .await
                .map_err(|source| ComposeError::Io {
                    path: path.clone(),
                    source,
                })?;
            inputs.push(path);
        }

        tracing::info!("Merging {} documents into {:?}", inputs.len(), output);
        self.run(compose_args(&inputs, output)).await
    }
}

#[async_trait]
impl Compressor for Ghostscript {
    async fn compress(&self, input: &Path, output: &Path) -> Result<(), ComposeError> {
        tracing::info!("Compressing {:?} into {:?}", input, output);
        self.run(compress_args(input, output)).await
    }
}
