//! # ccompiler
//!
//! Запуск Closure Compiler для наборов файлов.
//!
//! ## Основные модули
//!
//! - [`flags`] - Перевод опций во флаги командной строки
//! - [`pipeline`] - Конвейер запуска компилятора по группам файлов
//! - [`locate`] - Поиск `compiler.jar`
//! - [`config`] - Файл конфигурации задачи (`ccompiler.toml`)
//! - [`install`] - Загрузка компилятора
//!
//! ## Пример
//!
//! ```rust,ignore
//! use ccompiler::{CompilationOptions, FileGroup, Pipeline};
//!
//! let options = CompilationOptions::new()
//!     .with_closure_path("compiler/compiler.jar")
//!     .with_flag("compilation_level", "SIMPLE");
//! let groups = vec![FileGroup::new("out.min.js", ["a.js", "b.js"])];
//!
//! let outcomes = Pipeline::new().run(&options, &groups)?;
//! ```

// === Ядро ===
pub mod error;
pub mod flags;
pub mod group;
pub mod options;
pub mod pipeline;

// === Окружение запуска ===
pub mod locate;
pub mod process;
pub mod runlog;

// === Конфигурация и установка ===
pub mod config;
pub mod install;

// === Re-exports для удобства ===
pub use config::{ResolvedTarget, TaskConfig};
pub use error::{CCompilerError, CCompilerResult};
pub use flags::{translate, translate_args};
pub use group::FileGroup;
pub use locate::{CompilerLocation, CompilerLocator};
pub use options::{CompilationOptions, OptionValue, SuccessPolicy};
pub use pipeline::{FailureReason, Pipeline, RunOutcome};
pub use process::{Invocation, ProcessRunner, SystemRunner};
