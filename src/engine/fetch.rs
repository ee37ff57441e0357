//! Fetch capability: copy one remote file to a local path.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::Path;
use tokio::process::Command;

/// Download `remote` to `dest`. Called once per file; no retry.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, remote: &str, dest: &Path) -> Result<()>;
}

/// Runs `program [args..] <remote> <dest>` after creating `dest`'s parent directory.
#[derive(Clone, Debug)]
pub struct CommandFetcher {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandFetcher {
    /// First element is the program, the rest are fixed leading args.
    pub fn from_command(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .context("fetch command is empty")?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl Fetcher for CommandFetcher {
    async fn fetch(&self, remote: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let output = run_command(
            &self.program,
            &self.args,
            &[OsStr::new(remote), dest.as_os_str()],
        )
        .await?;
        log::debug!("fetched {} -> {}: {}", remote, dest.display(), output.trim());
        Ok(())
    }
}

/// Run a command asynchronously and return stdout. Non-zero exit is an error carrying stderr.
pub async fn run_command(
    program: &str,
    args: &[String],
    extra: &[&OsStr],
) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .args(extra)
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("spawn {program}"))?;
    if !output.status.success() {
        bail!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
