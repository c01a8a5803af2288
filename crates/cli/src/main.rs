mod render;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use cmdtree_core::command_set::ModeRef;
use cmdtree_core::grammar::parser::compile;
use cmdtree_core::{
    CommandDescriptor, CommandSet, CommandTree, LoadError, Mode, ParseOutcome, Privilege,
    Session, complete, describe, parse,
};
use cmdtree_diagnostics::{self as diag, Diagnostic, codes};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::render::{Format, has_errors, print_json, print_summary, render_diagnostics_pretty};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "cmdtree",
    version,
    about = "Load a router command set and check, parse, complete, or inspect it"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Log installation and matching steps to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Load a command set and verify every command is reachable.
    Check {
        /// Command-set JSON file.
        file: PathBuf,
    },

    /// Resolve one line to a command and its arguments.
    Parse {
        /// Command-set JSON file.
        file: PathBuf,
        /// The line, as typed.
        line: String,
        #[command(flatten)]
        session: SessionArgs,
    },

    /// List completions for the last token of a partial line.
    Complete {
        /// Command-set JSON file.
        file: PathBuf,
        /// The partial line; a trailing space asks for the next token.
        line: String,
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Context help for a partial line, as `?` shows it.
    Describe {
        /// Command-set JSON file.
        file: PathBuf,
        /// The partial line; a trailing `?` is ignored.
        line: String,
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Print the command tree of one mode, every mode, or the modifiers.
    Tree {
        /// Command-set JSON file.
        file: PathBuf,
        /// Mode name or id; all modes when omitted.
        #[arg(long, conflicts_with = "modifiers")]
        mode: Option<String>,
        /// Print the output-modifier tree instead.
        #[arg(long)]
        modifiers: bool,
    },

    /// Explain a diagnostic ID (e.g. CLI1002).
    Explain { id: String },
}

/// Who is typing.
#[derive(Args, Debug)]
struct SessionArgs {
    /// Mode name or id; defaults to the first declared mode.
    #[arg(long)]
    mode: Option<String>,
    /// Session privilege level.
    #[arg(long, default_value_t = Privilege::NORMAL.0)]
    privilege: u8,
    /// Reveal hidden commands and bypass the privilege ceiling.
    #[arg(long)]
    advanced: bool,
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    if let Err(err) = run(cli.cmd, format) {
        if format == Format::Json {
            print_json(&serde_json::json!({
                "success": false,
                "error": "command_failed",
                "message": format!("{err:#}"),
            }))?;
            process::exit(1);
        }
        return Err(err);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "cmdtree=debug,cmdtree_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cmd: Cmd, format: Format) -> Result<()> {
    match cmd {
        Cmd::Check { file } => cmd_check(&file, format),
        Cmd::Parse {
            file,
            line,
            session,
        } => cmd_parse(&file, &line, &session, format),
        Cmd::Complete {
            file,
            line,
            session,
        } => cmd_complete(&file, &line, &session, format),
        Cmd::Describe {
            file,
            line,
            session,
        } => cmd_describe(&file, &line, &session, format),
        Cmd::Tree {
            file,
            mode,
            modifiers,
        } => cmd_tree(&file, mode.as_deref(), modifiers, format),
        Cmd::Explain { id } => cmd_explain(&id, format),
    }
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_check(file: &Path, format: Format) -> Result<()> {
    let set = load_set(file)?;
    let (tree, diagnostics) = match set.build() {
        Ok(tree) => {
            let diagnostics = shadowed_commands(&set, &tree)?;
            (Some(tree), diagnostics)
        }
        Err(err) => (None, vec![load_diagnostic(&err)?]),
    };
    let modes = tree.as_ref().map_or(0, |t| t.modes().count());

    match format {
        Format::Json => print_json(&serde_json::json!({
            "success": !has_errors(&diagnostics),
            "commands": set.commands.len(),
            "modes": modes,
            "diagnostics": diagnostics,
        }))?,
        Format::Pretty => {
            for d in &diagnostics {
                // Installer spans point into the template named in the context.
                let source = d
                    .context
                    .as_ref()
                    .and_then(|c| c.get("template"))
                    .map_or("", String::as_str);
                render_diagnostics_pretty(source, "<template>", std::slice::from_ref(d));
            }
            print_summary(&diagnostics);
            if tree.is_some() {
                println!(
                    "{}: {} commands in {} modes",
                    file.display(),
                    set.commands.len(),
                    modes
                );
            }
        }
    }

    if has_errors(&diagnostics) {
        process::exit(1);
    }
    Ok(())
}

fn cmd_parse(file: &Path, line: &str, args: &SessionArgs, format: Format) -> Result<()> {
    let (set, tree) = load_tree(file)?;
    let session = session_for(&set, args)?;
    let result = parse(&tree, &session, line);

    match format {
        Format::Json => {
            let command = result.command().map(|m| {
                serde_json::json!({
                    "handler": m.command.handler,
                    "template": m.command.template,
                    "args": m.args,
                    "target_mode": m.target_mode,
                })
            });
            let modifier = result.modifier.as_ref().map(|m| {
                serde_json::json!({
                    "handler": m.command.handler,
                    "args": m.args,
                    "offset": m.offset,
                })
            });
            print_json(&serde_json::json!({
                "status": result.outcome.status().as_str(),
                "command": command,
                "modifier": modifier,
                "diagnostics": result.diagnostics,
            }))?;
        }
        Format::Pretty => {
            if let Some(m) = result.command() {
                println!("{} {}", m.command.handler, m.args.join(" "));
                if let Some(target) = m.target_mode {
                    println!("  -> mode {}", mode_label(&set, target));
                }
            }
            if let Some(m) = &result.modifier {
                println!("| {} {}", m.command.handler, m.args.join(" "));
            }
            render_diagnostics_pretty(line, "<line>", &result.diagnostics);
        }
    }

    if !matches!(result.outcome, ParseOutcome::Success(_) | ParseOutcome::EmptyLine) {
        process::exit(1);
    }
    Ok(())
}

fn cmd_complete(file: &Path, line: &str, args: &SessionArgs, format: Format) -> Result<()> {
    let (set, tree) = load_tree(file)?;
    let session = session_for(&set, args)?;
    let completions = complete(&tree, &session, line);
    match format {
        Format::Json => print_json(&completions)?,
        Format::Pretty => {
            for c in &completions {
                println!("{}", c.text);
            }
        }
    }
    Ok(())
}

fn cmd_describe(file: &Path, line: &str, args: &SessionArgs, format: Format) -> Result<()> {
    let (set, tree) = load_tree(file)?;
    let session = session_for(&set, args)?;
    let entries = describe(&tree, &session, line);
    match format {
        Format::Json => print_json(&entries)?,
        Format::Pretty => {
            let width = entries.iter().map(|d| d.token.len()).max().unwrap_or(0);
            for d in &entries {
                println!("  {:width$}  {}", d.token, d.help);
            }
        }
    }
    Ok(())
}

fn cmd_tree(file: &Path, mode: Option<&str>, modifiers: bool, format: Format) -> Result<()> {
    let (set, tree) = load_tree(file)?;

    if modifiers {
        match format {
            Format::Json => {
                let modifiers = tree.modifiers();
                let modifiers: Vec<&CommandDescriptor> =
                    modifiers.iter().map(|d| &**d).collect();
                print_json(&modifiers)?;
            }
            Format::Pretty => print!("{}", tree.dump_modifiers().unwrap_or_default()),
        }
        return Ok(());
    }

    let modes: Vec<Mode> = match mode {
        Some(m) => vec![set.resolve(&mode_ref(m))?],
        None => tree.modes().collect(),
    };
    match format {
        Format::Json => {
            let out: Vec<_> = modes
                .iter()
                .map(|&m| {
                    serde_json::json!({
                        "mode": m,
                        "name": set.mode_by_id(m).map(|d| d.name.as_str()),
                        "commands": tree
                            .commands(m)
                            .iter()
                            .map(|d| &**d)
                            .collect::<Vec<&CommandDescriptor>>(),
                    })
                })
                .collect();
            print_json(&out)?;
        }
        Format::Pretty => {
            for m in modes {
                let dump = tree
                    .dump(m)
                    .ok_or_else(|| anyhow!("no commands in mode {}", mode_label(&set, m)))?;
                println!("mode {}:", mode_label(&set, m));
                print!("{dump}");
            }
        }
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => print_json(&serde_json::json!({
            "id": id,
            "explanation": diag::explain(id),
        }))?,
        Format::Pretty => {
            use ariadne::Fmt;
            match diag::explain(id) {
                Some(text) => println!("{}: {}", id.fg(ariadne::Color::Cyan), text),
                None => println!("{id}: (no explanation available)"),
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn load_set(file: &Path) -> Result<CommandSet> {
    CommandSet::load(file).with_context(|| format!("failed to load {}", file.display()))
}

fn load_tree(file: &Path) -> Result<(CommandSet, CommandTree)> {
    let set = load_set(file)?;
    let tree = set
        .build()
        .with_context(|| format!("failed to build {}", file.display()))?;
    debug!(nodes = tree.node_count(), "command tree ready");
    Ok((set, tree))
}

fn mode_ref(text: &str) -> ModeRef {
    match text.parse() {
        Ok(id) => ModeRef::Id(id),
        Err(_) => ModeRef::Name(text.to_string()),
    }
}

fn mode_label(set: &CommandSet, mode: Mode) -> String {
    match set.mode_by_id(mode) {
        Some(decl) => format!("{} ({})", decl.name, mode),
        None => mode.to_string(),
    }
}

fn session_for(set: &CommandSet, args: &SessionArgs) -> Result<Session> {
    let mode = match &args.mode {
        Some(m) => set.resolve(&mode_ref(m))?,
        None => set
            .modes
            .first()
            .map(|d| Mode(d.id))
            .context("the command set declares no modes; pass --mode")?,
    };
    Ok(Session::new(mode, Privilege(args.privilege)).with_advanced(args.advanced))
}

/// Turn a build failure into a diagnostic; I/O and JSON errors stay errors.
fn load_diagnostic(err: &LoadError) -> Result<Diagnostic> {
    match err {
        LoadError::Install { template, source } => {
            Ok(source.to_diagnostic().note("template", template.as_str()))
        }
        LoadError::UnknownMode { name } => Ok(Diagnostic::error(
            codes::INSTALL_UNKNOWN_MODE,
            err.to_string(),
            None,
        )
        .note("mode", name.as_str())),
        other => Err(anyhow!("{other}")),
    }
}

/// Warn about commands whose sample line resolves to something else.
fn shadowed_commands(set: &CommandSet, tree: &CommandTree) -> Result<Vec<Diagnostic>> {
    let mut out = Vec::new();
    for entry in &set.commands {
        let line = compile(&entry.template)?.sample_line();
        for mode in &entry.modes {
            let mode = set.resolve(mode)?;
            let session = Session::new(mode, Privilege::PVR_MAX).with_advanced(true);
            let result = parse(tree, &session, &line);
            let reached = result
                .command()
                .is_some_and(|m| m.command.template == entry.template);
            if !reached {
                out.push(
                    Diagnostic::warn(
                        codes::INSTALL_SHADOWED_COMMAND,
                        format!(
                            "`{}` does not reach `{}` in mode {}",
                            line,
                            entry.template,
                            mode_label(set, mode)
                        ),
                        None,
                    )
                    .note("line", line.as_str())
                    .note("status", result.outcome.status().as_str()),
                );
            }
        }
    }
    Ok(out)
}
