//! Compilation options: pass-through compiler flags plus structural settings.
//!
//! Проходные флаги хранятся в упорядоченной карте: порядок ключей
//! определяет порядок флагов в командной строке.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Уровни компиляции Closure Compiler.
pub const WHITESPACE_ONLY: &str = "WHITESPACE_ONLY";
pub const SIMPLE: &str = "SIMPLE";
pub const ADVANCED: &str = "ADVANCED";

/// Журнал по умолчанию (относительно рабочей директории).
pub const DEFAULT_LOG_FILE: &str = "closure.log";

/// Программа запуска JVM по умолчанию.
pub const DEFAULT_JAVA: &str = "java";

/// Значение проходного флага.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// `true` → `--key`, `false` → ничего
    Bool(bool),
    /// `--key value`
    Text(String),
    /// Элементы выводятся как есть
    List(Vec<String>),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(value: Vec<String>) -> Self {
        OptionValue::List(value)
    }
}

/// Как трактовать завершение внешнего процесса.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuccessPolicy {
    /// Успех = непустой вывод компилятора
    #[default]
    Output,
    /// Успех = код возврата 0
    ExitStatus,
}

/// Набор опций компиляции.
///
/// Структурные поля потребляются конвейером и никогда не превращаются
/// во флаги; всё остальное попадает в [`CompilationOptions::flags`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompilationOptions {
    /// Литеральная строка, заменяющая все проходные флаги
    #[serde(default, rename = "override", skip_serializing_if = "Option::is_none")]
    pub override_flags: Option<String>,

    /// Явный путь к compiler.jar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closure_path: Option<PathBuf>,

    /// Программа JVM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java: Option<String>,

    /// Аргументы JVM перед `-jar`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jvm_flags: Option<Vec<String>>,

    /// Писать ли вывод компилятора в журнал
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<bool>,

    /// Путь к журналу
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Формат source map (`--source_map_format`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map_format: Option<String>,

    /// Тайм-аут одного вызова, в секундах
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Критерий успеха
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<SuccessPolicy>,

    /// Проходные флаги в порядке объявления
    #[serde(flatten)]
    pub flags: IndexMap<String, OptionValue>,
}

impl CompilationOptions {
    /// Создать пустой набор опций.
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавить проходной флаг (builder).
    pub fn with_flag(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.set_flag(key, value);
        self
    }

    /// Установить проходной флаг.
    ///
    /// Существующий ключ сохраняет свою позицию.
    pub fn set_flag(&mut self, key: &str, value: impl Into<OptionValue>) {
        self.flags.insert(key.to_string(), value.into());
    }

    /// Установить override (builder).
    pub fn with_override(mut self, text: &str) -> Self {
        self.override_flags = Some(text.to_string());
        self
    }

    /// Установить путь к компилятору (builder).
    pub fn with_closure_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.closure_path = Some(path.into());
        self
    }

    /// Непустой override, если задан.
    pub fn active_override(&self) -> Option<&str> {
        self.override_flags
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn java(&self) -> &str {
        self.java.as_deref().unwrap_or(DEFAULT_JAVA)
    }

    pub fn jvm_flags(&self) -> &[String] {
        self.jvm_flags.as_deref().unwrap_or(&[])
    }

    pub fn log_enabled(&self) -> bool {
        self.log.unwrap_or(true)
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn success_policy(&self) -> SuccessPolicy {
        self.success.unwrap_or_default()
    }

    /// Наложить опции цели поверх опций задачи.
    ///
    /// Значения `overlay` побеждают; новые флаги добавляются в конец,
    /// уже известные остаются на своих местах.
    pub fn merged_with(&self, overlay: &CompilationOptions) -> CompilationOptions {
        let mut flags = self.flags.clone();
        for (key, value) in &overlay.flags {
            flags.insert(key.clone(), value.clone());
        }

        CompilationOptions {
            override_flags: overlay
                .override_flags
                .clone()
                .or_else(|| self.override_flags.clone()),
            closure_path: overlay
                .closure_path
                .clone()
                .or_else(|| self.closure_path.clone()),
            java: overlay.java.clone().or_else(|| self.java.clone()),
            jvm_flags: overlay.jvm_flags.clone().or_else(|| self.jvm_flags.clone()),
            log: overlay.log.or(self.log),
            log_file: overlay.log_file.clone().or_else(|| self.log_file.clone()),
            source_map_format: overlay
                .source_map_format
                .clone()
                .or_else(|| self.source_map_format.clone()),
            timeout_secs: overlay.timeout_secs.or(self.timeout_secs),
            success: overlay.success.or(self.success),
            flags,
        }
    }
}
