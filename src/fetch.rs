//! Purpose: Package-fetch wrappers around external package-manager processes.
//! Exports: `FetchCommand`, `restore_native_packages`, `install_js_packages`.
//! Role: Configuration glue; the fetched packages are opaque to this crate.
//! Invariants: A non-zero exit code from the external process is configuration-fatal.
//! Invariants: The working directory must exist before anything is spawned.
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::core::error::{Error, ErrorKind};

const NATIVE_PROGRAM: &str = "vcpkg";
const JS_PROGRAM: &str = "npm";
const STDERR_TAIL_LINES: usize = 4;

/// One external package-manager invocation: program, working directory,
/// option list. Output is captured; failures carry the stderr tail.
#[derive(Clone, Debug)]
pub struct FetchCommand {
    program: String,
    workdir: PathBuf,
    args: Vec<String>,
}

impl FetchCommand {
    pub fn new(program: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            workdir: workdir.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, T>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn run(&self) -> Result<(), Error> {
        if !self.workdir.is_dir() {
            return Err(Error::new(ErrorKind::NotFound)
                .with_message("working directory does not exist")
                .with_path(&self.workdir));
        }
        info!(
            program = self.program.as_str(),
            workdir = %self.workdir.display(),
            args = ?self.args,
            "running package fetch"
        );
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|err| {
                Error::new(ErrorKind::Process)
                    .with_message(format!("failed to start `{}`", self.program))
                    .with_path(&self.workdir)
                    .with_source(err)
            })?;
        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let mut err = Error::new(ErrorKind::Process)
                .with_message(format!("`{}` exited with status {code}", self.program))
                .with_path(&self.workdir);
            let tail = stderr_tail(&output.stderr);
            if !tail.is_empty() {
                err = err.with_hint(tail);
            }
            return Err(err);
        }
        debug!(program = self.program.as_str(), "package fetch finished");
        Ok(())
    }
}

/// Native package restore (`vcpkg install` by default).
pub fn restore_native_packages(
    workdir: &Path,
    program: Option<&str>,
    options: &[String],
) -> Result<(), Error> {
    FetchCommand::new(program.unwrap_or(NATIVE_PROGRAM), workdir)
        .arg("install")
        .args(options.iter().cloned())
        .run()
}

/// JavaScript package install (`npm install` by default).
pub fn install_js_packages(
    workdir: &Path,
    program: Option<&str>,
    options: &[String],
) -> Result<(), Error> {
    FetchCommand::new(program.unwrap_or(JS_PROGRAM), workdir)
        .arg("install")
        .args(options.iter().cloned())
        .run()
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
