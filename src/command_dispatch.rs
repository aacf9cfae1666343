//! Purpose: Hold top-level CLI command dispatch for `linkhook`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Output envelopes and exit-code semantics stay unchanged across releases.
use super::*;

use linkhook::api::{Manifest, apply, detect_host_arch, install_js_packages,
    restore_native_packages};

pub(super) fn dispatch_command(command: Command, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = completion_command();
            clap_complete::aot::generate(shell, &mut cmd, "linkhook", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Apply { manifest, json } => {
            let document = Manifest::load(&manifest)?;
            let manifest_dir = manifest
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let report = apply(&document, manifest_dir)?;
            if json {
                emit_json(json!({ "report": report.to_json() }));
            } else {
                emit_apply_human(&report, color_mode);
            }
            Ok(RunOutcome::ok())
        }
        Command::Arch { compiler, json } => {
            let arch = detect_host_arch(&compiler)?;
            if json {
                emit_json(json!({
                    "arch": {
                        "cpu": arch.cpu.name(),
                        "platform": arch.platform.name(),
                    }
                }));
            } else {
                println!("cpu: {}", arch.cpu.name());
                println!("platform: {}", arch.platform.name());
            }
            Ok(RunOutcome::ok())
        }
        Command::Fetch { command } => {
            match command {
                FetchCommandCli::Native { args } => {
                    restore_native_packages(&args.dir, args.program.as_deref(), &args.options)?;
                }
                FetchCommandCli::Js { args } => {
                    install_js_packages(&args.dir, args.program.as_deref(), &args.options)?;
                }
            }
            Ok(RunOutcome::ok())
        }
    }
}

fn emit_apply_human(report: &linkhook::api::ApplyReport, color_mode: ColorMode) {
    let use_color = color_mode.use_color(io::stdout().is_terminal());
    let heading = |text: &str| {
        if use_color {
            format!("\x1b[1m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    };

    println!("{}", heading("links"));
    for edge in report.graph.edges() {
        println!(
            "  {} -> {} ({})",
            edge.consumer,
            edge.dep.name(),
            edge.scope.name()
        );
    }
    if !report.fired_hooks.is_empty() {
        println!("{}", heading("fired hooks"));
        for hook in &report.fired_hooks {
            println!("  {}", hook.display());
        }
    }
}
