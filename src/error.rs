//! Определения ошибок для ccompiler.

use std::path::PathBuf;
use thiserror::Error;

use crate::install::InstallError;
use crate::locate::LocationSource;

/// Основной тип `Result` для библиотеки.
pub type CCompilerResult<T> = Result<T, CCompilerError>;

/// Ошибки, прерывающие запуск целиком.
///
/// Сбои отдельных групп файлов сюда не попадают: они возвращаются
/// как [`crate::pipeline::RunOutcome::Failure`].
#[derive(Error, Debug)]
pub enum CCompilerError {
    #[error("Compiler path not defined (set closure_path, CLOSURE_PATH or run `ccompiler install`)")]
    CompilerNotConfigured,

    #[error("Compiler not found at {path} (from {origin})")]
    CompilerMissing {
        path: PathBuf,
        origin: LocationSource,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Install(#[from] InstallError),
}

impl CCompilerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CCompilerError::Io {
            path: path.into(),
            source,
        }
    }
}
