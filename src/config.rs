//! Task configuration (`ccompiler.toml` or a JSON equivalent).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CCompilerError, CCompilerResult};
use crate::group::FileGroup;
use crate::options::CompilationOptions;

/// Файл конфигурации по умолчанию.
pub const CONFIG_FILE: &str = "ccompiler.toml";

/// Конфигурация задачи: общие опции и именованные цели.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Сколько компиляторов запускать одновременно
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,

    /// Опции уровня задачи
    #[serde(default)]
    pub options: CompilationOptions,

    /// Цели в порядке объявления
    #[serde(default)]
    pub targets: IndexMap<String, Target>,
}

/// Одна цель.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Target {
    /// Опции цели (поверх опций задачи)
    #[serde(default)]
    pub options: CompilationOptions,

    /// Выходной файл → исходники
    #[serde(default)]
    pub files: IndexMap<PathBuf, Vec<PathBuf>>,
}

impl Target {
    /// Группы файлов в порядке объявления.
    pub fn file_groups(&self) -> Vec<FileGroup> {
        self.files
            .iter()
            .map(|(dest, src)| FileGroup::new(dest.clone(), src.iter().cloned()))
            .collect()
    }
}

/// Готовая к запуску цель.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub name: String,
    pub options: CompilationOptions,
    pub groups: Vec<FileGroup>,
}

impl TaskConfig {
    /// Загрузить конфигурацию; формат выбирается по расширению.
    pub fn load(path: impl AsRef<Path>) -> CCompilerResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| CCompilerError::io(path, e))?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    pub fn from_toml(content: &str) -> CCompilerResult<Self> {
        toml::from_str(content).map_err(|e| CCompilerError::Config(e.to_string()))
    }

    pub fn from_json(content: &str) -> CCompilerResult<Self> {
        serde_json::from_str(content).map_err(|e| CCompilerError::Config(e.to_string()))
    }

    /// Найти `ccompiler.toml` в текущей директории или родительских.
    pub fn find() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let candidate = current.join(CONFIG_FILE);
            if candidate.exists() {
                return Some(candidate);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Цели с уже наложенными опциями.
    ///
    /// Пустой список имён означает все цели в порядке объявления.
    pub fn resolve_targets(&self, names: &[String]) -> CCompilerResult<Vec<ResolvedTarget>> {
        let selected: Vec<(&String, &Target)> = if names.is_empty() {
            self.targets.iter().collect()
        } else {
            names
                .iter()
                .map(|name| {
                    self.targets
                        .get_key_value(name)
                        .ok_or_else(|| CCompilerError::UnknownTarget(name.clone()))
                })
                .collect::<CCompilerResult<_>>()?
        };

        Ok(selected
            .into_iter()
            .map(|(name, target)| ResolvedTarget {
                name: name.clone(),
                options: self.options.merged_with(&target.options),
                groups: target.file_groups(),
            })
            .collect())
    }
}
