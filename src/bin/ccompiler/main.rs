//! ccompiler CLI
//!
//! Запуск Closure Compiler по целям из `ccompiler.toml`.
//!
//! # Использование
//!
//! ```bash
//! # Выполнить все цели
//! ccompiler run
//!
//! # Выполнить отдельные цели, по четыре компилятора одновременно
//! ccompiler run default_options custom_options --jobs 4
//!
//! # Показать команды без запуска
//! ccompiler run --dry-run
//!
//! # Одна группа без файла конфигурации
//! ccompiler compile -o dist/app.min.js src/a.js src/b.js --level ADVANCED
//!
//! # Скачать компилятор
//! ccompiler install
//! ```

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::LevelFilter;
use std::path::PathBuf;
use std::process::ExitCode;

use ccompiler::install::COMPILER_VERSION;

/// Closure Compiler runner
#[derive(Parser)]
#[command(name = "ccompiler")]
#[command(version)]
#[command(about = "Closure Compiler runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run targets from the configuration file
    Run {
        /// Targets to run (all when omitted)
        targets: Vec<String>,

        /// Configuration file (default: nearest ccompiler.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of compilers to run at once
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Print commands without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Compile one file group
    Compile {
        /// Output file
        #[arg(short, long)]
        out: PathBuf,

        /// Source files, in order
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Path to compiler.jar
        #[arg(long)]
        closure_path: Option<PathBuf>,

        /// Compilation level (WHITESPACE_ONLY, SIMPLE, ADVANCED)
        #[arg(short, long)]
        level: Option<String>,

        /// Extra compiler flag: KEY or KEY=VALUE
        #[arg(short, long = "flag")]
        flags: Vec<String>,

        /// Literal flags replacing every other option
        #[arg(long = "override")]
        override_flags: Option<String>,

        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Judge success by exit status instead of output
        #[arg(long)]
        exit_status: bool,

        /// Do not append compiler output to closure.log
        #[arg(long)]
        no_log: bool,
    },

    /// Download Closure Compiler
    Install {
        /// Install directory (default: compiler/ next to the executable)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Compiler release to download
        #[arg(long, default_value = COMPILER_VERSION)]
        compiler_version: String,

        /// Expected SHA-256 of the archive
        #[arg(long)]
        sha256: Option<String>,
    },
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run {
            targets,
            config,
            jobs,
            dry_run,
        } => commands::run_targets(&targets, config.as_deref(), jobs, dry_run, cli.verbose),
        Commands::Compile {
            out,
            sources,
            closure_path,
            level,
            flags,
            override_flags,
            timeout,
            exit_status,
            no_log,
        } => {
            let request = commands::CompileRequest {
                out,
                sources,
                closure_path,
                level,
                flags,
                override_flags,
                timeout,
                exit_status,
                no_log,
            };
            commands::compile(request, cli.verbose)
        }
        Commands::Install {
            dir,
            compiler_version,
            sha256,
        } => commands::install(dir, &compiler_version, sha256.as_deref(), cli.quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !cli.quiet {
                eprintln!("{}: {}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}
