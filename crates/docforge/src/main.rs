//! The docforge command line.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use crossbeam_channel::unbounded;
use docforge::import::HttpTransport;
use docforge::worker::{Event, spawn_assembly, spawn_import};
use docforge::{DocumentRequest, ImportMode, Outline, Role, SectionStore, Settings};

#[derive(Debug, Clone, Parser)]
#[clap(name = "docforge", author, version, about)]
struct Args {
    /// Path to the settings file
    #[clap(long, global = true, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Prints debug logs
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Clone, Subcommand)]
#[clap(rename_all = "kebab-case")]
enum Commands {
    /// Generates a DOCX document from an outline file
    Build(BuildArgs),
    /// Imports sections from plain text into an outline file
    Import(ImportArgs),
    /// Manages the settings file
    #[clap(subcommand)]
    Settings(SettingsCommands),
}

#[derive(Debug, Clone, Parser)]
struct BuildArgs {
    /// Path to the outline file
    #[clap(value_name = "OUTLINE")]
    outline: PathBuf,

    /// Path to the output file. Defaults to the outline's `output` key, then
    /// to the outline path with a `.docx` extension
    #[clap(long, short, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Overrides the document title
    #[clap(long)]
    title: Option<String>,
}

#[derive(Debug, Clone, Parser)]
struct ImportArgs {
    /// Path to the text to import, or `-` for stdin
    #[clap(value_name = "TEXT")]
    text: PathBuf,

    /// Path to the outline file to update. Created if missing
    #[clap(long, value_name = "OUTLINE")]
    outline: PathBuf,

    /// Replaces the sections of the outline instead of appending
    #[clap(long)]
    replace: bool,

    /// The API key. Overrides the settings file
    #[clap(long, env = "DOCFORGE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// The model identifier. Overrides the settings file
    #[clap(long)]
    model: Option<String>,

    /// The chat-completion endpoint. Overrides the settings file
    #[clap(long)]
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
#[clap(rename_all = "kebab-case")]
enum SettingsCommands {
    /// Writes a settings file holding the defaults
    Init {
        /// Overwrites an existing file
        #[clap(long)]
        force: bool,
    },
    /// Prints the effective settings
    Show,
}

/// The main entry point.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Starts logging
    let _ = {
        use log::LevelFilter::*;

        let level = if args.verbose { Debug } else { Info };
        env_logger::builder()
            .filter_module("docforge", level)
            .format_timestamp(None)
            .try_init()
    };

    let settings_path = match args.settings {
        Some(path) => path,
        None => Settings::default_path().context("cannot determine the config directory")?,
    };

    match args.cmd {
        Commands::Build(build) => build_main(build, &settings_path),
        Commands::Import(import) => import_main(import, &settings_path),
        Commands::Settings(cmd) => settings_main(cmd, &settings_path),
    }
}

fn build_main(args: BuildArgs, settings_path: &Path) -> anyhow::Result<()> {
    let settings = Settings::load(settings_path)?;
    let outline = Outline::load(&args.outline)?;

    let mut style = settings.style;
    if let Some(caption) = &outline.toc_caption {
        style.toc_caption = caption.clone();
    }
    let output = match (args.output, &outline.output) {
        (Some(output), _) => output,
        (None, Some(output)) => relative_to(&args.outline, output),
        (None, None) => args.outline.with_extension("docx"),
    };
    let title = args.title.unwrap_or_else(|| outline.title.clone());

    let (store, rejected) = outline.into_store();
    for r in &rejected {
        log::warn!("outline: section #{} skipped: {}", r.index + 1, r.reason);
    }

    let req = DocumentRequest::new(output, title, &store, &style);
    req.validate()?;

    let (tx, rx) = unbounded();
    let worker = spawn_assembly(req, tx);
    let mut result = None;
    for event in rx.iter() {
        match event {
            Event::Progress(milestone) => {
                log::info!("[{:>3}%] {milestone}", milestone.percent());
            }
            Event::Assembled(res) => result = Some(res),
            Event::Log(..) | Event::Failed(..) | Event::Imported(..) => {}
        }
    }
    if worker.join().is_err() {
        bail!("the assembly worker panicked");
    }

    match result {
        Some(Ok(path)) => {
            println!("{}", path.display());
            Ok(())
        }
        Some(Err(err)) => Err(err.into()),
        None => bail!("the assembly worker exited without a result"),
    }
}

fn import_main(args: ImportArgs, settings_path: &Path) -> anyhow::Result<()> {
    let mut api = Settings::load(settings_path)?.api;
    if let Some(key) = args.api_key {
        api.key = key;
    }
    if let Some(model) = args.model {
        api.model = model;
    }
    if let Some(endpoint) = args.endpoint {
        api.endpoint = endpoint;
    }

    let text = if args.text == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        text
    } else {
        std::fs::read_to_string(&args.text)
            .with_context(|| format!("failed to read {}", args.text.display()))?
    };

    let mut outline = if args.outline.exists() {
        Outline::load(&args.outline)?
    } else {
        Outline::default()
    };
    let mode = if args.replace {
        ImportMode::Replace
    } else {
        ImportMode::Append
    };
    let mut store = outline.store_for_import(mode)?;

    let (tx, rx) = unbounded();
    let worker = spawn_import(HttpTransport::new()?, api, text, tx);
    let mut result = None;
    for event in rx.iter() {
        if let Event::Imported(res) = event {
            result = Some(res);
        }
    }
    if worker.join().is_err() {
        bail!("the import worker panicked");
    }

    let outcome = match result {
        Some(res) => res?,
        None => bail!("the import worker exited without a result"),
    };
    for item in &outcome.skipped {
        log::warn!("import: element #{} skipped: {}", item.index + 1, item.reason);
    }

    let imported = outcome.sections.len();
    apply(&mut store, outcome.sections, mode);
    outline.set_sections(&store);
    outline.save(&args.outline)?;

    log::info!(
        "imported {imported} sections into {} ({} in total)",
        args.outline.display(),
        store.len()
    );
    Ok(())
}

fn apply(store: &mut SectionStore, drafts: Vec<docforge::SectionDraft>, mode: ImportMode) {
    for r in store.extend(drafts, mode) {
        log::warn!("import: section #{} skipped: {}", r.index + 1, r.reason);
    }
}

fn settings_main(cmd: SettingsCommands, path: &Path) -> anyhow::Result<()> {
    match cmd {
        SettingsCommands::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists, pass --force to overwrite", path.display());
            }
            if force && path.exists() {
                std::fs::remove_file(path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
            }
            let settings = Settings::default();
            settings.save_api(path)?;
            settings.save_style(path)?;
            println!("{}", path.display());
        }
        SettingsCommands::Show => {
            let settings = Settings::load(path)?;
            let api = &settings.api;
            let key = if api.key.is_empty() { "(not set)" } else { "(set)" };

            println!("settings: {}", path.display());
            println!("api: endpoint={} model={} key={key}", api.endpoint, api.model);
            for role in Role::ALL {
                let spec = settings.style.get(role);
                println!(
                    "style.{role}: font={} size={} bold={} color={}",
                    spec.font, spec.size_pt, spec.bold, spec.color
                );
            }
            println!(
                "layout: indent-chars={} toc-caption={:?}",
                settings.style.indent_chars, settings.style.toc_caption
            );
            let logo = &settings.style.logo;
            println!(
                "logo: enabled={} path={} width-cm={}",
                logo.enabled,
                logo.path.display(),
                logo.width_cm
            );
        }
    }
    Ok(())
}

/// Resolves `path` against the directory of `base`.
fn relative_to(base: &Path, path: &Path) -> PathBuf {
    match base.parent() {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_owned(),
    }
}
