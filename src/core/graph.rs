//! Purpose: Explicit build-graph registry: targets, properties, hook lists, link edges.
//! Exports: `BuildGraph`, `Target`, `TargetKind`, `LinkScope`, `DepRef`, `LinkEdge`.
//! Role: Owned state for one configuration pass; no process-wide singletons.
//! Invariants: Hook-file lists stay duplicate-free under propagation.
//! Invariants: Interface-only targets never accumulate hook files via propagation.
//! Invariants: Link edges are recorded in call order and never reordered.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, ErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TargetKind {
    Compiled,
    InterfaceOnly,
}

impl TargetKind {
    pub fn name(self) -> &'static str {
        match self {
            TargetKind::Compiled => "compiled",
            TargetKind::InterfaceOnly => "interface-only",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "compiled" => Some(TargetKind::Compiled),
            "interface-only" => Some(TargetKind::InterfaceOnly),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LinkScope {
    Public,
    Private,
    Interface,
}

impl LinkScope {
    /// Token keyword as it appears in link argument lists.
    pub fn keyword(self) -> &'static str {
        match self {
            LinkScope::Public => "PUBLIC",
            LinkScope::Private => "PRIVATE",
            LinkScope::Interface => "INTERFACE",
        }
    }

    pub fn from_keyword(token: &str) -> Option<Self> {
        match token {
            "PUBLIC" => Some(LinkScope::Public),
            "PRIVATE" => Some(LinkScope::Private),
            "INTERFACE" => Some(LinkScope::Interface),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LinkScope::Public => "public",
            LinkScope::Private => "private",
            LinkScope::Interface => "interface",
        }
    }
}

/// A link argument after resolution: either a declared target or an opaque
/// external library name forwarded verbatim.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DepRef {
    Target(String),
    External(String),
}

impl DepRef {
    pub fn name(&self) -> &str {
        match self {
            DepRef::Target(name) | DepRef::External(name) => name,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkEdge {
    pub consumer: String,
    pub scope: LinkScope,
    pub dep: DepRef,
}

#[derive(Clone, Debug)]
pub struct Target {
    name: String,
    kind: TargetKind,
    hook_files: Vec<PathBuf>,
    properties: BTreeMap<String, String>,
}

impl Target {
    fn new(name: String, kind: TargetKind) -> Self {
        Self {
            name,
            kind,
            hook_files: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn hook_files(&self) -> &[PathBuf] {
        &self.hook_files
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// Registry for one configuration pass. Passed by reference to every
/// operation; dropped when the pass ends.
#[derive(Clone, Debug, Default)]
pub struct BuildGraph {
    targets: BTreeMap<String, Target>,
    edges: Vec<LinkEdge>,
}

impl BuildGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_target(&mut self, name: &str, kind: TargetKind) -> Result<(), Error> {
        if self.targets.contains_key(name) {
            return Err(Error::new(ErrorKind::AlreadyExists)
                .with_message("target is already declared")
                .with_target(name));
        }
        self.targets
            .insert(name.to_string(), Target::new(name.to_string(), kind));
        Ok(())
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    pub fn contains_target(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn edges(&self) -> &[LinkEdge] {
        &self.edges
    }

    /// Unset properties read back as `None`; there is no empty-string default.
    pub fn property(&self, target: &str, key: &str) -> Option<&str> {
        self.targets
            .get(target)?
            .properties
            .get(key)
            .map(String::as_str)
    }

    pub fn set_property(&mut self, target: &str, key: &str, value: &str) -> Result<(), Error> {
        let entry = self.target_mut(target)?;
        entry.properties.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Appends `item` to a semicolon-joined list property, creating it if
    /// unset. Used for `compile-options` and `compile-definitions`.
    pub fn append_property_item(
        &mut self,
        target: &str,
        key: &str,
        item: &str,
    ) -> Result<(), Error> {
        let entry = self.target_mut(target)?;
        match entry.properties.get_mut(key) {
            Some(existing) if !existing.is_empty() => {
                existing.push(';');
                existing.push_str(item);
            }
            _ => {
                entry.properties.insert(key.to_string(), item.to_string());
            }
        }
        Ok(())
    }

    /// Explicit registration: duplicates are allowed and kept in order.
    /// Callers that need idempotence use `propagate_hooks` instead.
    pub fn register_hook(&mut self, target: &str, hook_file: &Path) -> Result<(), Error> {
        let entry = self.target_mut(target)?;
        if entry.kind == TargetKind::InterfaceOnly {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("interface-only targets cannot carry hook files")
                .with_target(target)
                .with_hint("Register the hook on a compiled target instead."));
        }
        entry.hook_files.push(hook_file.to_path_buf());
        Ok(())
    }

    /// Copies `library`'s hook files onto `target`, skipping references
    /// already present. New entries land after existing ones. No-op when
    /// `target` is interface-only.
    pub fn propagate_hooks(&mut self, library: &str, target: &str) -> Result<(), Error> {
        let incoming = self.target_ref(library)?.hook_files.clone();
        let entry = self.target_mut(target)?;
        if entry.kind == TargetKind::InterfaceOnly {
            return Ok(());
        }
        for hook_file in incoming {
            if !entry.hook_files.contains(&hook_file) {
                entry.hook_files.push(hook_file);
            }
        }
        Ok(())
    }

    /// The native link primitive: records the edge unconditionally. Hook
    /// behavior lives in `link::link_with_hooks`, which always delegates
    /// here first.
    pub fn link(&mut self, consumer: &str, scope: LinkScope, dep: DepRef) -> Result<(), Error> {
        self.target_ref(consumer)?;
        if let DepRef::Target(name) = &dep {
            self.target_ref(name)?;
        }
        self.edges.push(LinkEdge {
            consumer: consumer.to_string(),
            scope,
            dep,
        });
        Ok(())
    }

    fn target_ref(&self, name: &str) -> Result<&Target, Error> {
        self.targets.get(name).ok_or_else(|| {
            Error::new(ErrorKind::NotFound)
                .with_message("target is not declared")
                .with_target(name)
        })
    }

    fn target_mut(&mut self, name: &str) -> Result<&mut Target, Error> {
        self.targets.get_mut(name).ok_or_else(|| {
            Error::new(ErrorKind::NotFound)
                .with_message("target is not declared")
                .with_target(name)
        })
    }
}
