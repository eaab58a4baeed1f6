//! File groups: one destination plus its ordered sources.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Распознаваемые расширения скриптов.
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs"];

/// Группа файлов: один выходной файл и упорядоченный список исходников.
///
/// Порядок исходников важен: компилятор склеивает их именно в нём.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileGroup {
    /// Выходной файл
    pub dest: PathBuf,
    /// Исходные файлы
    pub src: Vec<PathBuf>,
}

impl FileGroup {
    /// Создать группу.
    pub fn new<P: Into<PathBuf>>(dest: impl Into<PathBuf>, src: impl IntoIterator<Item = P>) -> Self {
        Self {
            dest: dest.into(),
            src: src.into_iter().map(Into::into).collect(),
        }
    }

    /// Заканчивается ли выходной путь расширением скрипта.
    pub fn has_script_dest(&self) -> bool {
        is_script_path(&self.dest)
    }

    /// Исходники как строки для командной строки.
    pub fn src_strings(&self) -> Vec<String> {
        self.src
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect()
    }

    pub fn dest_string(&self) -> String {
        self.dest.to_string_lossy().into_owned()
    }
}

/// Проверить расширение пути.
pub fn is_script_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SCRIPT_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}
