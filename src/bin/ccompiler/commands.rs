//! CLI command implementations.

use ccompiler::config::{TaskConfig, CONFIG_FILE};
use ccompiler::install::Installer;
use ccompiler::locate::{bundled_dir, BUNDLED_DIR};
use ccompiler::options::OptionValue;
use ccompiler::{CompilationOptions, FileGroup, Pipeline, RunOutcome, SuccessPolicy};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Тип результата команды.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Выполнить цели из файла конфигурации.
pub fn run_targets(
    names: &[String],
    config: Option<&Path>,
    jobs: Option<usize>,
    dry_run: bool,
    verbose: bool,
) -> CommandResult {
    let config_path = match config {
        Some(path) => path.to_path_buf(),
        None => TaskConfig::find().ok_or_else(|| format!("No {} found", CONFIG_FILE))?,
    };
    let config = TaskConfig::load(&config_path)?;

    // Пути в конфигурации считаются от её директории.
    if let Some(dir) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if verbose {
            println!("{} Working directory {}", "→".blue(), dir.display());
        }
        std::env::set_current_dir(dir)?;
    }

    let targets = config.resolve_targets(names)?;
    if targets.is_empty() {
        println!("{} No targets to run", "✓".green());
        return Ok(());
    }

    let pipeline = Pipeline::new().jobs(jobs.or(config.jobs).unwrap_or(1));
    let mut failed = 0;

    for target in &targets {
        println!("{} Running ccompiler:{}", "→".blue(), target.name.bold());

        if dry_run {
            for planned in pipeline.plan(&target.options, &target.groups)? {
                match &planned.invocation {
                    Ok(invocation) => println!("  {}", invocation),
                    Err(reason) => println!(
                        "  {}",
                        format!("skip {}: {}", planned.dest.display(), reason).yellow()
                    ),
                }
            }
            continue;
        }

        let outcomes = pipeline.run(&target.options, &target.groups)?;
        failed += report(&outcomes, verbose);
    }

    if failed > 0 {
        Err(format!("{} file group(s) failed", failed).into())
    } else {
        Ok(())
    }
}

/// Параметры команды `compile`.
pub struct CompileRequest {
    pub out: PathBuf,
    pub sources: Vec<PathBuf>,
    pub closure_path: Option<PathBuf>,
    pub level: Option<String>,
    pub flags: Vec<String>,
    pub override_flags: Option<String>,
    pub timeout: Option<u64>,
    pub exit_status: bool,
    pub no_log: bool,
}

impl CompileRequest {
    fn options(&self) -> CompilationOptions {
        let mut options = CompilationOptions::new();

        if let Some(level) = &self.level {
            options.set_flag("compilation_level", level.as_str());
        }
        for flag in &self.flags {
            let (key, value) = parse_flag(flag);
            options.set_flag(key, value);
        }

        options.override_flags = self.override_flags.clone();
        options.closure_path = self.closure_path.clone();
        options.timeout_secs = self.timeout;
        if self.exit_status {
            options.success = Some(SuccessPolicy::ExitStatus);
        }
        if self.no_log {
            options.log = Some(false);
        }
        options
    }
}

/// `KEY` → `--KEY`, `KEY=VALUE` → `--KEY VALUE`.
fn parse_flag(flag: &str) -> (&str, OptionValue) {
    let flag = flag.trim_start_matches("--");
    match flag.split_once('=') {
        Some((key, value)) => (key, OptionValue::from(value)),
        None => (flag, OptionValue::Bool(true)),
    }
}

/// Скомпилировать одну группу файлов.
pub fn compile(request: CompileRequest, verbose: bool) -> CommandResult {
    let options = request.options();
    let group = FileGroup::new(request.out.clone(), request.sources.iter().cloned());

    let outcomes = Pipeline::new().run(&options, &[group])?;

    if report(&outcomes, verbose) > 0 {
        Err("Compilation failed".into())
    } else {
        Ok(())
    }
}

/// Напечатать итоги; вернуть число неудачных групп.
fn report(outcomes: &[RunOutcome], verbose: bool) -> usize {
    let mut failed = 0;

    for outcome in outcomes {
        let output = outcome.output().trim_end();
        if !output.is_empty() {
            println!("{}", output);
        }

        match outcome {
            RunOutcome::Success(done) => {
                if verbose {
                    println!(
                        "{} {} created! {}",
                        "✓".green(),
                        done.dest.display(),
                        format!("({:.2?})", done.duration).dimmed()
                    );
                } else {
                    println!("{}", format!("✓ {} created!", done.dest.display()).green());
                }
            }
            RunOutcome::Failure(failure) => {
                failed += 1;
                println!(
                    "{}",
                    format!("✗ {}: {}", failure.dest.display(), failure.reason).red()
                );
            }
        }
    }

    failed
}

/// Скачать компилятор.
pub fn install(
    dir: Option<PathBuf>,
    version: &str,
    sha256: Option<&str>,
    quiet: bool,
) -> CommandResult {
    let dir = dir
        .or_else(bundled_dir)
        .unwrap_or_else(|| PathBuf::from(BUNDLED_DIR));

    let installer = Installer::new(dir)
        .version(version)
        .checksum(sha256)
        .progress(!quiet);

    let jars = installer.install()?;

    for jar in &jars {
        println!("{} Installed {}", "✓".green(), jar.display());
    }

    Ok(())
}
