//! Purpose: Dependency link annotator: scoped linking plus on-link hook firing.
//! Exports: `ScopedDep`, `parse_link_args`, `link_with_hooks`.
//! Role: The one operation that combines graph edges with hook-file callbacks.
//! Invariants: The native link always happens before any hook fires for a dependency.
//! Invariants: With no registered hooks, behavior is identical to direct `BuildGraph::link`.
//! Invariants: Hook order is argument order, then registration order within a dependency.
use tracing::debug;

use crate::core::error::{Error, ErrorKind};
use crate::core::graph::{BuildGraph, DepRef, LinkScope, TargetKind};
use crate::core::hooks::HookLoader;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScopedDep {
    pub scope: LinkScope,
    pub name: String,
}

impl ScopedDep {
    pub fn new(scope: LinkScope, name: impl Into<String>) -> Self {
        Self {
            scope,
            name: name.into(),
        }
    }
}

/// Parses the mixed-token call surface: scope keywords update the current
/// scope for everything after them; every other token is a dependency name.
/// Scope starts at `PUBLIC`.
pub fn parse_link_args<I, T>(tokens: I) -> Vec<ScopedDep>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut scope = LinkScope::Public;
    let mut deps = Vec::new();
    for token in tokens {
        let token = token.as_ref();
        if let Some(keyword) = LinkScope::from_keyword(token) {
            scope = keyword;
        } else {
            deps.push(ScopedDep::new(scope, token));
        }
    }
    deps
}

/// Links each dependency into `consumer` and fires the on-link callbacks of
/// every linked library that carries hook files.
///
/// Dependency names that are not declared targets are forwarded verbatim as
/// external libraries; they cannot carry hooks. Interface-only dependencies
/// are linked but never fire hooks. A hook that mutates the consumer is
/// visible to dependencies processed later in the same call.
pub fn link_with_hooks(
    graph: &mut BuildGraph,
    loader: &dyn HookLoader,
    consumer: &str,
    deps: &[ScopedDep],
) -> Result<(), Error> {
    for dep in deps {
        let resolved = if graph.contains_target(&dep.name) {
            DepRef::Target(dep.name.clone())
        } else {
            DepRef::External(dep.name.clone())
        };
        graph.link(consumer, dep.scope, resolved.clone())?;
        debug!(
            consumer,
            dep = dep.name.as_str(),
            scope = dep.scope.name(),
            "linked dependency"
        );

        let DepRef::Target(name) = resolved else {
            continue;
        };
        let library = graph
            .target(&name)
            .ok_or_else(|| Error::new(ErrorKind::Internal)
                .with_message("linked target vanished during traversal")
                .with_target(&name))?;
        if library.kind() == TargetKind::InterfaceOnly {
            continue;
        }
        // Snapshot: the list is read, never mutated, during traversal.
        let hook_files = library.hook_files().to_vec();
        for hook_file in hook_files {
            // Fresh load per iteration; a callback from one file cannot
            // leak into the next.
            match loader.load(&hook_file)? {
                Some(hook) => {
                    debug!(
                        consumer,
                        dep = name.as_str(),
                        hook = %hook_file.display(),
                        "firing on-link callback"
                    );
                    hook.on_linked_as_dependency(graph, consumer)?;
                }
                None => {
                    debug!(
                        dep = name.as_str(),
                        hook = %hook_file.display(),
                        "hook file defines no callback"
                    );
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ScopedDep, link_with_hooks, parse_link_args};
    use crate::core::error::{Error, ErrorKind};
    use crate::core::graph::{BuildGraph, DepRef, LinkScope, TargetKind};
    use crate::core::hooks::{HookLoader, LinkedHook};
    use std::path::Path;

    /// Test loader that turns every hook path into a callback appending the
    /// path to the consumer's `fired-hooks` property.
    struct RecordingLoader;

    struct RecordingHook {
        label: String,
    }

    impl HookLoader for RecordingLoader {
        fn load(&self, path: &Path) -> Result<Option<Box<dyn LinkedHook>>, Error> {
            Ok(Some(Box::new(RecordingHook {
                label: path.to_string_lossy().to_string(),
            })))
        }
    }

    impl LinkedHook for RecordingHook {
        fn on_linked_as_dependency(
            &self,
            graph: &mut BuildGraph,
            consumer: &str,
        ) -> Result<(), Error> {
            graph.append_property_item(consumer, "fired-hooks", &self.label)
        }
    }

    /// Loader that fails every load; used to prove it is never consulted.
    struct PoisonLoader;

    impl HookLoader for PoisonLoader {
        fn load(&self, path: &Path) -> Result<Option<Box<dyn LinkedHook>>, Error> {
            Err(Error::new(ErrorKind::Io)
                .with_message("loader must not be called")
                .with_path(path))
        }
    }

    fn graph_with(names: &[(&str, TargetKind)]) -> BuildGraph {
        let mut graph = BuildGraph::new();
        for (name, kind) in names {
            graph.declare_target(name, *kind).expect("declare");
        }
        graph
    }

    #[test]
    fn parse_defaults_to_public_scope() {
        let deps = parse_link_args(["lib", "m"]);
        assert_eq!(
            deps,
            [
                ScopedDep::new(LinkScope::Public, "lib"),
                ScopedDep::new(LinkScope::Public, "m"),
            ]
        );
    }

    #[test]
    fn parse_scope_keywords_apply_until_overridden() {
        let deps = parse_link_args(["PRIVATE", "a", "b", "INTERFACE", "c", "PUBLIC", "d"]);
        assert_eq!(
            deps,
            [
                ScopedDep::new(LinkScope::Private, "a"),
                ScopedDep::new(LinkScope::Private, "b"),
                ScopedDep::new(LinkScope::Interface, "c"),
                ScopedDep::new(LinkScope::Public, "d"),
            ]
        );
    }

    #[test]
    fn hookless_link_matches_direct_link() {
        let targets = [("app", TargetKind::Compiled), ("lib", TargetKind::Compiled)];
        let deps = parse_link_args(["PRIVATE", "lib", "m"]);

        let mut annotated = graph_with(&targets);
        link_with_hooks(&mut annotated, &PoisonLoader, "app", &deps).expect("link");

        let mut direct = graph_with(&targets);
        direct
            .link("app", LinkScope::Private, DepRef::Target("lib".into()))
            .expect("link");
        direct
            .link("app", LinkScope::Private, DepRef::External("m".into()))
            .expect("link");

        assert_eq!(annotated.edges(), direct.edges());
    }

    #[test]
    fn unknown_tokens_forward_as_external_libraries() {
        let mut graph = graph_with(&[("app", TargetKind::Compiled)]);
        let deps = parse_link_args(["pthread", "dl"]);
        link_with_hooks(&mut graph, &PoisonLoader, "app", &deps).expect("link");
        assert_eq!(graph.edges()[0].dep, DepRef::External("pthread".into()));
        assert_eq!(graph.edges()[1].dep, DepRef::External("dl".into()));
    }

    #[test]
    fn hooks_fire_in_argument_then_registration_order() {
        let mut graph = graph_with(&[
            ("app", TargetKind::Compiled),
            ("a", TargetKind::Compiled),
            ("b", TargetKind::Compiled),
        ]);
        graph.register_hook("a", Path::new("h1")).expect("register");
        graph.register_hook("b", Path::new("h2")).expect("register");

        let deps = parse_link_args(["PUBLIC", "a", "PRIVATE", "b"]);
        link_with_hooks(&mut graph, &RecordingLoader, "app", &deps).expect("link");

        assert_eq!(graph.property("app", "fired-hooks"), Some("h1;h2"));
    }

    #[test]
    fn hooks_within_one_dependency_fire_in_registration_order() {
        let mut graph = graph_with(&[
            ("app", TargetKind::Compiled),
            ("lib", TargetKind::Compiled),
        ]);
        graph.register_hook("lib", Path::new("first")).expect("register");
        graph.register_hook("lib", Path::new("second")).expect("register");

        let deps = parse_link_args(["lib"]);
        link_with_hooks(&mut graph, &RecordingLoader, "app", &deps).expect("link");

        assert_eq!(graph.property("app", "fired-hooks"), Some("first;second"));
    }

    #[test]
    fn interface_only_dependency_never_consults_loader() {
        let mut graph = graph_with(&[
            ("app", TargetKind::Compiled),
            ("headers", TargetKind::InterfaceOnly),
        ]);
        let deps = parse_link_args(["INTERFACE", "headers"]);
        link_with_hooks(&mut graph, &PoisonLoader, "app", &deps).expect("link");
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn failed_hook_load_is_fatal_but_edge_is_already_recorded() {
        let mut graph = graph_with(&[
            ("app", TargetKind::Compiled),
            ("lib", TargetKind::Compiled),
        ]);
        graph.register_hook("lib", Path::new("broken")).expect("register");

        let deps = parse_link_args(["lib"]);
        let err = link_with_hooks(&mut graph, &PoisonLoader, "app", &deps).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn consumer_mutation_is_visible_to_later_dependencies() {
        struct MarkLoader;
        struct MarkHook;
        struct AssertLoader;
        struct AssertHook;

        impl HookLoader for MarkLoader {
            fn load(&self, path: &Path) -> Result<Option<Box<dyn LinkedHook>>, Error> {
                match path.to_str() {
                    Some("mark") => Ok(Some(Box::new(MarkHook))),
                    Some("assert") => Ok(Some(Box::new(AssertHook))),
                    _ => Ok(None),
                }
            }
        }

        impl LinkedHook for MarkHook {
            fn on_linked_as_dependency(
                &self,
                graph: &mut BuildGraph,
                consumer: &str,
            ) -> Result<(), Error> {
                graph.set_property(consumer, "seen-first", "yes")
            }
        }

        impl LinkedHook for AssertHook {
            fn on_linked_as_dependency(
                &self,
                graph: &mut BuildGraph,
                consumer: &str,
            ) -> Result<(), Error> {
                assert_eq!(graph.property(consumer, "seen-first"), Some("yes"));
                Ok(())
            }
        }

        let mut graph = graph_with(&[
            ("app", TargetKind::Compiled),
            ("first", TargetKind::Compiled),
            ("second", TargetKind::Compiled),
        ]);
        graph.register_hook("first", Path::new("mark")).expect("register");
        graph.register_hook("second", Path::new("assert")).expect("register");

        let deps = parse_link_args(["first", "second"]);
        link_with_hooks(&mut graph, &MarkLoader, "app", &deps).expect("link");
    }

    #[test]
    fn unknown_consumer_is_not_found() {
        let mut graph = graph_with(&[("lib", TargetKind::Compiled)]);
        let deps = parse_link_args(["lib"]);
        let err = link_with_hooks(&mut graph, &PoisonLoader, "ghost", &deps).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
