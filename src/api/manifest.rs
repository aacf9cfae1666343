//! Purpose: Drive a whole configuration pass from a JSON manifest.
//! Exports: `Manifest`, `TargetSpec`, `LinkSpec`, `ApplyReport`, `apply`.
//! Role: The standalone-tool surface over the core mechanism; used by the CLI.
//! Invariants: Hook paths in a manifest resolve relative to the manifest file.
//! Invariants: Link entries run in manifest order; the fired-hook log keeps that order.
use std::cell::RefCell;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Value, json};

use crate::core::error::{Error, ErrorKind};
use crate::core::graph::{BuildGraph, DepRef, TargetKind};
use crate::core::hooks::{HookLoader, LinkedHook};
use crate::core::link::{link_with_hooks, parse_link_args};
use crate::core::script::ScriptLoader;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSpec {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub hooks: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkSpec {
    pub consumer: String,
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_kind() -> String {
    "compiled".to_string()
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            let kind = if err.kind() == std::io::ErrorKind::NotFound {
                ErrorKind::NotFound
            } else {
                ErrorKind::Io
            };
            Error::new(kind)
                .with_message("failed to read manifest")
                .with_path(path)
                .with_source(err)
        })?;
        serde_json::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Malformed)
                .with_message("manifest is not valid")
                .with_path(path)
                .with_source(err)
        })
    }
}

/// Outcome of one configuration pass: the final graph plus the hook files
/// whose callbacks actually fired, in firing order.
#[derive(Debug)]
pub struct ApplyReport {
    pub graph: BuildGraph,
    pub fired_hooks: Vec<PathBuf>,
}

impl ApplyReport {
    pub fn to_json(&self) -> Value {
        let targets = self
            .graph
            .targets()
            .map(|target| {
                let hooks = target
                    .hook_files()
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>();
                let properties = target
                    .properties()
                    .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                    .collect::<serde_json::Map<_, _>>();
                json!({
                    "name": target.name(),
                    "kind": target.kind().name(),
                    "hooks": hooks,
                    "properties": properties,
                })
            })
            .collect::<Vec<_>>();
        let links = self
            .graph
            .edges()
            .iter()
            .map(|edge| {
                json!({
                    "consumer": edge.consumer,
                    "scope": edge.scope.name(),
                    "dep": edge.dep.name(),
                    "external": matches!(edge.dep, DepRef::External(_)),
                })
            })
            .collect::<Vec<_>>();
        let fired = self
            .fired_hooks
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>();
        json!({
            "targets": targets,
            "links": links,
            "fired_hooks": fired,
        })
    }
}

/// Wraps the real loader to log which hook files produced a callback.
struct RecordingLoader<'a> {
    inner: &'a ScriptLoader,
    fired: RefCell<Vec<PathBuf>>,
}

impl HookLoader for RecordingLoader<'_> {
    fn load(&self, path: &Path) -> Result<Option<Box<dyn LinkedHook>>, Error> {
        let hook = self.inner.load(path)?;
        if hook.is_some() {
            self.fired.borrow_mut().push(path.to_path_buf());
        }
        Ok(hook)
    }
}

/// Declares the manifest's targets and hooks, then executes its link
/// entries in order with the shipped JSON hook loader.
pub fn apply(manifest: &Manifest, manifest_dir: &Path) -> Result<ApplyReport, Error> {
    let mut graph = BuildGraph::new();

    for spec in &manifest.targets {
        let kind = TargetKind::parse(&spec.kind).ok_or_else(|| {
            Error::new(ErrorKind::Malformed)
                .with_message(format!("unknown target kind `{}`", spec.kind))
                .with_target(&spec.name)
                .with_hint("Use `compiled` or `interface-only`.")
        })?;
        graph.declare_target(&spec.name, kind)?;
        for hook in &spec.hooks {
            graph.register_hook(&spec.name, &manifest_dir.join(hook))?;
        }
    }

    let script_loader = ScriptLoader::new();
    let loader = RecordingLoader {
        inner: &script_loader,
        fired: RefCell::new(Vec::new()),
    };
    for link in &manifest.links {
        let deps = parse_link_args(&link.args);
        link_with_hooks(&mut graph, &loader, &link.consumer, &deps)?;
    }

    Ok(ApplyReport {
        graph,
        fired_hooks: loader.fired.into_inner(),
    })
}
