use std::collections::BTreeSet;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use ocfl_extension::ExtensionRegistry;
use ocfl_object::{check_root, Object, StorageRoot};
use ocfl_store::{FileSystem, LocalFs};
use ocfl_validation::{Severity, ValidationSession};

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = CliConfig::load(cli.config.as_deref())?;
    let registry = Arc::new(ExtensionRegistry::with_builtins());
    match cli.command {
        Command::Init(args) => cmd_init(args, &config, registry),
        Command::Add(args) => cmd_add(args, &config, registry),
        Command::Update(args) => cmd_update(args, &config, registry),
        Command::Delete(args) => cmd_delete(args, &config, registry),
        Command::Stat(args) => cmd_stat(args, registry),
        Command::List(args) => cmd_list(args, registry),
        Command::Extract(args) => cmd_extract(args, registry),
        Command::Check(args) => cmd_check(args, registry),
    }
}

fn local(path: &Path) -> Arc<dyn FileSystem> {
    Arc::new(LocalFs::new(path))
}

fn open_root(path: &Path, registry: Arc<ExtensionRegistry>) -> anyhow::Result<StorageRoot> {
    StorageRoot::load(local(path), registry).with_context(|| format!("opening storage root {}", path.display()))
}

/// Every file below `source`, relative to it.
fn source_files(source: &dyn FileSystem) -> anyhow::Result<Vec<String>> {
    let mut files = Vec::new();
    source.walk("", &mut |path| {
        files.push(path.to_string());
        Ok(())
    })?;
    Ok(files)
}

/// Add every file listed in `files` from `source` to the open version.
fn stage_files(object: &mut Object, source: &LocalFs, files: &[String]) -> anyhow::Result<()> {
    for logical in files {
        let reader = source.open(logical)?;
        object
            .add_reader(logical, reader)
            .with_context(|| format!("adding {logical}"))?;
    }
    Ok(())
}

fn list_source(source: &Path) -> anyhow::Result<(LocalFs, Vec<String>)> {
    let fs = LocalFs::new(source);
    let files = source_files(&fs).with_context(|| format!("reading {}", source.display()))?;
    Ok((fs, files))
}

fn commit(object: &mut Object) -> anyhow::Result<ExitCode> {
    match object.commit().with_context(|| format!("committing {}", object.id()))? {
        Some(version) => println!("{} {} {}", "✓".green().bold(), object.id().bold(), version.to_string().yellow()),
        None => println!("{} unchanged", object.id().bold()),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_init(args: InitArgs, config: &CliConfig, registry: Arc<ExtensionRegistry>) -> anyhow::Result<ExitCode> {
    let root_config = config.root_config(args.layout.as_deref(), args.description);
    let root = StorageRoot::init(local(&args.root), &root_config, registry)
        .with_context(|| format!("initialising {}", args.root.display()))?;
    println!("{} Initialized OCFL {} storage root in {}", "✓".green().bold(), root.spec_version(), args.root.display().to_string().bold());
    if let Some(layout) = root.layout() {
        println!("  Layout: {}", layout.name().cyan());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_add(args: AddArgs, config: &CliConfig, registry: Arc<ExtensionRegistry>) -> anyhow::Result<ExitCode> {
    let root = open_root(&args.root, registry)?;
    let mut object = root.create_object(&args.id, &config.object_config())?;
    object.start_update(&args.message, &config.user.name, &config.user.address)?;
    let (source, files) = list_source(&args.source)?;
    stage_files(&mut object, &source, &files)?;
    for path in &files {
        println!("  {} {}", "added:".green(), path);
    }
    commit(&mut object)
}

fn cmd_update(args: UpdateArgs, config: &CliConfig, registry: Arc<ExtensionRegistry>) -> anyhow::Result<ExitCode> {
    let root = open_root(&args.root, registry)?;
    let mut object = root.open_object(&args.id)?;
    let previous = object.files(None)?;
    object.start_update(&args.message, &config.user.name, &config.user.address)?;
    let (source, files) = list_source(&args.source)?;
    let present: BTreeSet<&str> = files.iter().map(String::as_str).collect();
    // Removals first, so a path may turn from directory into file.
    for logical in previous.keys().filter(|p| !present.contains(p.as_str())) {
        object.delete_file(logical)?;
        println!("  {} {}", "deleted:".red(), logical);
    }
    stage_files(&mut object, &source, &files)?;
    commit(&mut object)
}

fn cmd_delete(args: DeleteArgs, config: &CliConfig, registry: Arc<ExtensionRegistry>) -> anyhow::Result<ExitCode> {
    let root = open_root(&args.root, registry)?;
    let mut object = root.open_object(&args.id)?;
    object.start_update(&args.message, &config.user.name, &config.user.address)?;
    for logical in &args.paths {
        if !object.delete_file(logical)? {
            bail!("{} has no file {logical}", args.id);
        }
        println!("  {} {}", "deleted:".red(), logical);
    }
    commit(&mut object)
}

fn cmd_stat(args: StatArgs, registry: Arc<ExtensionRegistry>) -> anyhow::Result<ExitCode> {
    let root = open_root(&args.root, registry)?;
    let object = root.open_object(&args.id)?;
    let inventory = object.inventory();
    println!("Object {}", object.id().bold());
    println!("  Location: {}", object.location());
    println!("  Spec: {}  Digest: {}", object.spec_version(), inventory.digest_algorithm());
    println!("  Head: {}  Files: {}", object.head().to_string().yellow(), object.files(None)?.len());
    for (number, version) in inventory.versions().iter().rev() {
        let user = version.user.as_ref().map(|u| u.name.as_str()).unwrap_or("-");
        println!(
            "{}  {}  {}  {}",
            number.to_string().yellow().bold(),
            version.created.to_rfc3339().dimmed(),
            user,
            version.message.as_deref().unwrap_or(""),
        );
    }
    for (name, value) in object.metadata()? {
        println!("  {}: {}", name.cyan(), value);
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_list(args: ListArgs, registry: Arc<ExtensionRegistry>) -> anyhow::Result<ExitCode> {
    let root = open_root(&args.root, registry)?;
    let ids = root.object_ids()?;
    if ids.is_empty() {
        println!("No objects.");
    }
    for id in ids {
        println!("{id}");
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_extract(args: ExtractArgs, registry: Arc<ExtensionRegistry>) -> anyhow::Result<ExitCode> {
    let root = open_root(&args.root, registry)?;
    let object = root.open_object(&args.id)?;
    let target = LocalFs::new(&args.dest);
    let count = object
        .extract(args.version, &target)
        .with_context(|| format!("extracting {} to {}", args.id, args.dest.display()))?;
    let version = args.version.unwrap_or_else(|| object.head());
    println!("{} {} files of {} {}", "✓".green().bold(), count, args.id.bold(), version.to_string().yellow());
    Ok(ExitCode::SUCCESS)
}

fn cmd_check(args: CheckArgs, registry: Arc<ExtensionRegistry>) -> anyhow::Result<ExitCode> {
    let mut session = ValidationSession::new();
    match &args.object {
        Some(id) => open_root(&args.root, registry)?.check_object(id, &mut session)?,
        None => check_root(local(&args.root).as_ref(), &registry, &mut session)
            .with_context(|| format!("checking {}", args.root.display()))?,
    }
    session.compact();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&session)?),
        OutputFormat::Text => print_findings(&session),
    }
    Ok(if session.is_valid() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_findings(session: &ValidationSession) {
    for entry in session.entries() {
        let code = match entry.severity {
            Severity::Error => entry.code.as_str().red().bold(),
            Severity::Warning => entry.code.as_str().yellow().bold(),
        };
        let object = entry.object.as_deref().map(|o| format!("[{o}] ")).unwrap_or_default();
        println!("{code} {object}{}", entry.context);
        println!("     {}", entry.reference.dimmed());
    }
    let errors = session.errors().count();
    let warnings = session.warnings().count();
    if errors == 0 {
        println!("{} valid ({warnings} warnings)", "✓".green().bold());
    } else {
        println!("{} {errors} errors, {warnings} warnings", "✗".red().bold());
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn run(args: &[&str]) -> ExitCode {
        run_command(Cli::try_parse_from(args).unwrap()).unwrap()
    }

    #[test]
    fn init_add_update_check() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let src = dir.path().join("src");
        let config = dir.path().join("none.toml");
        let (root_s, src_s, config_s) = (root.to_str().unwrap(), src.to_str().unwrap(), config.to_str().unwrap());

        std::fs::create_dir_all(src.join("sub")).unwrap();
        std::fs::write(src.join("a.txt"), "alpha").unwrap();
        std::fs::write(src.join("sub/b.txt"), "beta").unwrap();

        run(&["ocfl", "-c", config_s, "init", root_s]);
        run(&["ocfl", "-c", config_s, "add", root_s, "urn:x:1", src_s, "-m", "first"]);

        std::fs::remove_file(src.join("a.txt")).unwrap();
        std::fs::write(src.join("sub/b.txt"), "beta two").unwrap();
        run(&["ocfl", "-c", config_s, "update", root_s, "urn:x:1", src_s, "-m", "second"]);

        let registry = Arc::new(ExtensionRegistry::with_builtins());
        let object = open_root(&root, registry).unwrap().open_object("urn:x:1").unwrap();
        assert_eq!(object.head().number(), 2);
        let files = object.files(None).unwrap();
        assert_eq!(files.keys().collect::<Vec<_>>(), vec!["sub/b.txt"]);

        assert_eq!(run(&["ocfl", "-c", config_s, "check", root_s]), ExitCode::SUCCESS);
    }

    #[test]
    fn update_turns_directory_into_file() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let src = dir.path().join("src");
        let config = dir.path().join("none.toml");
        let (root_s, src_s, config_s) = (root.to_str().unwrap(), src.to_str().unwrap(), config.to_str().unwrap());

        std::fs::create_dir_all(src.join("docs")).unwrap();
        std::fs::write(src.join("docs/readme.txt"), "read me").unwrap();
        run(&["ocfl", "-c", config_s, "init", root_s]);
        run(&["ocfl", "-c", config_s, "add", root_s, "urn:x:2", src_s, "-m", "first"]);

        std::fs::remove_dir_all(src.join("docs")).unwrap();
        std::fs::write(src.join("docs"), "now a file").unwrap();
        run(&["ocfl", "-c", config_s, "update", root_s, "urn:x:2", src_s, "-m", "second"]);

        let registry = Arc::new(ExtensionRegistry::with_builtins());
        let object = open_root(&root, registry).unwrap().open_object("urn:x:2").unwrap();
        let files = object.files(None).unwrap();
        assert_eq!(files.keys().collect::<Vec<_>>(), vec!["docs"]);
        assert_eq!(run(&["ocfl", "-c", config_s, "check", root_s]), ExitCode::SUCCESS);
    }

    #[test]
    fn check_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("none.toml");
        std::fs::write(dir.path().join("stray.txt"), "x").unwrap();
        let code = run(&["ocfl", "-c", config.to_str().unwrap(), "check", dir.path().to_str().unwrap()]);
        assert_eq!(code, ExitCode::FAILURE);
    }
}
