//! Purpose: The shipped JSON hook-file loader.
//! Exports: `ScriptLoader`.
//! Role: Parses hook files into `LinkedHook` callbacks for the annotator.
//! Invariants: Every load parses the file from scratch; no state crosses loads.
//! Invariants: An absent `on_linked_as_dependency` key is a soft no-op, never an error.
//! Invariants: Unreadable or malformed hook files abort the configuration pass.
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::core::error::{Error, ErrorKind};
use crate::core::graph::BuildGraph;
use crate::core::hooks::{HookLoader, LinkedHook};

const HOOK_KEY: &str = "on_linked_as_dependency";

/// Hook files are JSON objects. One with an `on_linked_as_dependency` key
/// carries a directive list that becomes the on-link callback:
///
/// ```json
/// {
///   "on_linked_as_dependency": [
///     {"set_property": {"name": "uses-lib", "value": "1"}},
///     {"add_compile_definitions": ["WITH_LIB"]},
///     {"register_hooks": ["downstream.json"]}
///   ]
/// }
/// ```
///
/// Paths in `register_hooks` resolve relative to the hook file itself.
#[derive(Clone, Debug, Default)]
pub struct ScriptLoader;

impl ScriptLoader {
    pub fn new() -> Self {
        Self
    }
}

impl HookLoader for ScriptLoader {
    fn load(&self, path: &Path) -> Result<Option<Box<dyn LinkedHook>>, Error> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::new(map_io_error_kind(&err))
                .with_message("failed to read hook file")
                .with_path(path)
                .with_source(err)
        })?;
        let document: Value = serde_json::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Malformed)
                .with_message("hook file is not valid JSON")
                .with_path(path)
                .with_source(err)
        })?;
        let Value::Object(fields) = document else {
            return Err(Error::new(ErrorKind::Malformed)
                .with_message("hook file must be a JSON object")
                .with_path(path));
        };
        let Some(raw_directives) = fields.get(HOOK_KEY) else {
            debug!(path = %path.display(), "hook file defines no on-link callback");
            return Ok(None);
        };
        let Value::Array(entries) = raw_directives else {
            return Err(Error::new(ErrorKind::Malformed)
                .with_message(format!("`{HOOK_KEY}` must be a directive list"))
                .with_path(path));
        };

        let hook_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut directives = Vec::with_capacity(entries.len());
        for entry in entries {
            directives.push(parse_directive(entry, hook_dir, path)?);
        }
        debug!(
            path = %path.display(),
            directives = directives.len(),
            "loaded on-link callback"
        );
        Ok(Some(Box::new(ScriptHook { directives })))
    }
}

#[derive(Clone, Debug)]
enum Directive {
    SetProperty { name: String, value: String },
    AddCompileDefinitions(Vec<String>),
    RegisterHooks(Vec<PathBuf>),
}

struct ScriptHook {
    directives: Vec<Directive>,
}

impl LinkedHook for ScriptHook {
    fn on_linked_as_dependency(
        &self,
        graph: &mut BuildGraph,
        consumer: &str,
    ) -> Result<(), Error> {
        for directive in &self.directives {
            match directive {
                Directive::SetProperty { name, value } => {
                    graph.set_property(consumer, name, value)?;
                }
                Directive::AddCompileDefinitions(definitions) => {
                    for definition in definitions {
                        graph.append_property_item(consumer, "compile-definitions", definition)?;
                    }
                }
                Directive::RegisterHooks(paths) => {
                    for path in paths {
                        graph.register_hook(consumer, path)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn parse_directive(entry: &Value, hook_dir: &Path, path: &Path) -> Result<Directive, Error> {
    let Value::Object(fields) = entry else {
        return Err(malformed_directive("directive must be a JSON object", path));
    };
    let mut keys = fields.keys();
    let (Some(name), None) = (keys.next(), keys.next()) else {
        return Err(malformed_directive(
            "directive must have exactly one key",
            path,
        ));
    };
    match name.as_str() {
        "set_property" => {
            let body = &fields[name];
            let prop_name = string_field(body, "name")
                .ok_or_else(|| malformed_directive("set_property requires a `name` string", path))?;
            let prop_value = string_field(body, "value").ok_or_else(|| {
                malformed_directive("set_property requires a `value` string", path)
            })?;
            Ok(Directive::SetProperty {
                name: prop_name,
                value: prop_value,
            })
        }
        "add_compile_definitions" => {
            let definitions = string_list(&fields[name]).ok_or_else(|| {
                malformed_directive("add_compile_definitions requires a string list", path)
            })?;
            Ok(Directive::AddCompileDefinitions(definitions))
        }
        "register_hooks" => {
            let entries = string_list(&fields[name]).ok_or_else(|| {
                malformed_directive("register_hooks requires a string list", path)
            })?;
            let paths = entries
                .into_iter()
                .map(|entry| hook_dir.join(entry))
                .collect();
            Ok(Directive::RegisterHooks(paths))
        }
        other => Err(malformed_directive(
            format!("unknown directive `{other}`"),
            path,
        )),
    }
}

fn malformed_directive(message: impl Into<String>, path: &Path) -> Error {
    Error::new(ErrorKind::Malformed)
        .with_message(message)
        .with_path(path)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(str::to_string)
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let entries = value.as_array()?;
    entries
        .iter()
        .map(|entry| entry.as_str().map(str::to_string))
        .collect()
}

fn map_io_error_kind(err: &std::io::Error) -> ErrorKind {
    match err.kind() {
        std::io::ErrorKind::NotFound => ErrorKind::NotFound,
        _ => ErrorKind::Io,
    }
}
