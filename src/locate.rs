//! Разрешение пути к компилятору.
//!
//! Порядок: явный путь, затем переменная окружения, затем копия,
//! установленная рядом с исполняемым файлом.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CCompilerError, CCompilerResult};

/// Переменная окружения с путём к компилятору.
pub const CLOSURE_PATH_ENV: &str = "CLOSURE_PATH";

/// Директория установленного компилятора (рядом с исполняемым файлом).
pub const BUNDLED_DIR: &str = "compiler";

/// Имя архива компилятора.
pub const COMPILER_JAR: &str = "compiler.jar";

/// Откуда взят путь.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    /// Опция `closure_path`
    Explicit,
    /// Переменная `CLOSURE_PATH`
    Environment,
    /// Установленная копия
    Bundled,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationSource::Explicit => write!(f, "closure_path option"),
            LocationSource::Environment => write!(f, "{} environment variable", CLOSURE_PATH_ENV),
            LocationSource::Bundled => write!(f, "bundled compiler"),
        }
    }
}

/// Разрешённое местоположение компилятора.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerLocation {
    pub path: PathBuf,
    pub source: LocationSource,
}

/// Резолвер пути к компилятору.
#[derive(Debug, Clone, Default)]
pub struct CompilerLocator {
    explicit: Option<PathBuf>,
    env_value: Option<OsString>,
    bundled: Option<PathBuf>,
}

impl CompilerLocator {
    /// Резолвер без источников.
    pub fn new() -> Self {
        Self::default()
    }

    /// Резолвер, читающий окружение процесса и установленную копию.
    pub fn from_env() -> Self {
        Self {
            explicit: None,
            env_value: std::env::var_os(CLOSURE_PATH_ENV),
            bundled: bundled_compiler_path(),
        }
    }

    /// Явный путь (наивысший приоритет).
    pub fn explicit(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.explicit = path.map(Into::into);
        self
    }

    /// Значение переменной окружения.
    pub fn env_value(mut self, value: Option<OsString>) -> Self {
        self.env_value = value;
        self
    }

    /// Путь к установленной копии.
    pub fn bundled(mut self, path: Option<PathBuf>) -> Self {
        self.bundled = path;
        self
    }

    /// Найти компилятор.
    ///
    /// Заданный, но отсутствующий явный путь или путь из окружения считается
    /// ошибкой; перехода к следующему источнику не происходит.
    pub fn resolve(&self) -> CCompilerResult<CompilerLocation> {
        if let Some(path) = &self.explicit {
            return check(path, LocationSource::Explicit);
        }

        if let Some(value) = self.env_value.as_ref().filter(|v| !v.is_empty()) {
            return check(Path::new(value), LocationSource::Environment);
        }

        match &self.bundled {
            Some(path) if path.is_file() => Ok(CompilerLocation {
                path: path.clone(),
                source: LocationSource::Bundled,
            }),
            _ => Err(CCompilerError::CompilerNotConfigured),
        }
    }
}

fn check(path: &Path, source: LocationSource) -> CCompilerResult<CompilerLocation> {
    if path.is_file() {
        Ok(CompilerLocation {
            path: path.to_path_buf(),
            source,
        })
    } else {
        Err(CCompilerError::CompilerMissing {
            path: path.to_path_buf(),
            origin: source,
        })
    }
}

/// Директория установки рядом с исполняемым файлом.
pub fn bundled_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    Some(exe.parent()?.join(BUNDLED_DIR))
}

/// `<exe dir>/compiler/compiler.jar`.
pub fn bundled_compiler_path() -> Option<PathBuf> {
    bundled_dir().map(|dir| dir.join(COMPILER_JAR))
}
