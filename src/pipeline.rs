//! Invocation pipeline.
//!
//! Для каждой группы файлов: построить команду, подготовить выходной
//! путь, запустить компилятор, интерпретировать вывод, дописать
//! комментарий `sourceMappingURL` и журнал. Сбой одной группы не
//! прерывает остальные; отсутствие компилятора прерывает запуск до
//! первого вызова.

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::error::CCompilerResult;
use crate::flags::{map_path, source_mapping_comment, translate_args};
use crate::group::FileGroup;
use crate::locate::{CompilerLocation, CompilerLocator};
use crate::options::{CompilationOptions, SuccessPolicy};
use crate::process::{Invocation, ProcessError, ProcessRunner, SystemRunner};
use crate::runlog::RunLog;

/// Отчёт об успешной группе.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    pub dest: PathBuf,
    pub map_path: PathBuf,
    /// Сырой вывод компилятора
    pub output: String,
    pub duration: Duration,
    pub exit_code: Option<i32>,
}

/// Отчёт о неудачной группе.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    pub dest: PathBuf,
    pub reason: FailureReason,
    /// Вывод компилятора, если процесс успел отработать
    pub output: String,
}

/// Причина неудачи группы.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    #[error("compiler produced no output")]
    NoOutput,

    #[error("compiler exited with {}", exit_label(.0))]
    ExitStatus(Option<i32>),

    #[error("compiler timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Spawn(String),

    #[error("destination {0} is not a script file (.js, .mjs, .cjs)")]
    InvalidDestination(PathBuf),

    #[error("filesystem error on {path}: {message}")]
    Filesystem { path: PathBuf, message: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

/// Итог одной группы.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Success(CompileReport),
    Failure(CompileFailure),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success(_))
    }

    pub fn dest(&self) -> &Path {
        match self {
            RunOutcome::Success(report) => &report.dest,
            RunOutcome::Failure(failure) => &failure.dest,
        }
    }

    pub fn output(&self) -> &str {
        match self {
            RunOutcome::Success(report) => &report.output,
            RunOutcome::Failure(failure) => &failure.output,
        }
    }

    fn failure(dest: &Path, reason: FailureReason, output: String) -> Self {
        RunOutcome::Failure(CompileFailure {
            dest: dest.to_path_buf(),
            reason,
            output,
        })
    }
}

/// Запланированный вызов (для `--dry-run`).
///
/// `invocation` равен `Err`, если `run` отклонил бы группу до запуска.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedInvocation {
    pub dest: PathBuf,
    pub invocation: Result<Invocation, FailureReason>,
}

/// Конвейер запуска компилятора.
pub struct Pipeline<R: ProcessRunner = SystemRunner> {
    runner: R,
    locator: CompilerLocator,
    jobs: usize,
}

impl Pipeline<SystemRunner> {
    /// Конвейер с системным исполнителем и окружением процесса.
    pub fn new() -> Self {
        Self::with_runner(SystemRunner)
    }
}

impl Default for Pipeline<SystemRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ProcessRunner> Pipeline<R> {
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner,
            locator: CompilerLocator::from_env(),
            jobs: 1,
        }
    }

    /// Заменить источники пути к компилятору.
    pub fn locator(mut self, locator: CompilerLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Максимум одновременно запущенных компиляторов (минимум 1).
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Разрешить путь к компилятору; `closure_path` из опций главнее.
    pub fn resolve_compiler(&self, options: &CompilationOptions) -> CCompilerResult<CompilerLocation> {
        match &options.closure_path {
            Some(path) => self.locator.clone().explicit(Some(path)).resolve(),
            None => self.locator.resolve(),
        }
    }

    /// Построить команды, ничего не запуская.
    pub fn plan(
        &self,
        options: &CompilationOptions,
        groups: &[FileGroup],
    ) -> CCompilerResult<Vec<PlannedInvocation>> {
        let location = self.resolve_compiler(options)?;

        Ok(groups
            .iter()
            .map(|group| PlannedInvocation {
                dest: group.dest.clone(),
                invocation: check_destination(group)
                    .map(|()| build_invocation(options, &location, group)),
            })
            .collect())
    }

    /// Выполнить все группы.
    ///
    /// Возвращает ровно по одному итогу на группу в порядке `groups`.
    /// `Err` только для ошибок конфигурации: тогда ни один процесс не
    /// запускается и ни один файл не пишется.
    pub fn run(
        &self,
        options: &CompilationOptions,
        groups: &[FileGroup],
    ) -> CCompilerResult<Vec<RunOutcome>> {
        let location = self.resolve_compiler(options)?;
        debug!(
            "Using compiler {} ({})",
            location.path.display(),
            location.source
        );

        let log = options.log_enabled().then(|| RunLog::new(options.log_file()));
        let job = GroupJob {
            runner: &self.runner,
            options,
            location: &location,
            log: log.as_ref(),
        };

        let workers = self.jobs.min(groups.len());
        if workers <= 1 {
            return Ok(groups.iter().map(|group| job.run(group)).collect());
        }

        Ok(run_parallel(&job, groups, workers))
    }
}

/// Параллельный запуск: рабочие потоки забирают группы по индексу,
/// итоги раскладываются по исходным позициям.
fn run_parallel<R: ProcessRunner>(
    job: &GroupJob<'_, R>,
    groups: &[FileGroup],
    workers: usize,
) -> Vec<RunOutcome> {
    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<RunOutcome>>> = Mutex::new(vec![None; groups.len()]);

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                let Some(group) = groups.get(index) else {
                    break;
                };
                let outcome = job.run(group);
                let mut slots = slots.lock().unwrap_or_else(|p| p.into_inner());
                slots[index] = Some(outcome);
            });
        }
    });

    slots
        .into_inner()
        .unwrap_or_else(|p| p.into_inner())
        .into_iter()
        .flatten()
        .collect()
}

/// Компилятор пишет только скрипты; остальное отклоняется до запуска.
fn check_destination(group: &FileGroup) -> Result<(), FailureReason> {
    if group.has_script_dest() {
        Ok(())
    } else {
        Err(FailureReason::InvalidDestination(group.dest.clone()))
    }
}

fn build_invocation(
    options: &CompilationOptions,
    location: &CompilerLocation,
    group: &FileGroup,
) -> Invocation {
    let flags = translate_args(options, &group.src_strings(), &group.dest_string());
    Invocation::java_jar(options.java(), options.jvm_flags(), &location.path, flags)
}

/// Всё, что нужно для обработки одной группы.
struct GroupJob<'a, R: ProcessRunner> {
    runner: &'a R,
    options: &'a CompilationOptions,
    location: &'a CompilerLocation,
    log: Option<&'a RunLog>,
}

impl<R: ProcessRunner> GroupJob<'_, R> {
    fn run(&self, group: &FileGroup) -> RunOutcome {
        let outcome = self.execute(group);
        match &outcome {
            RunOutcome::Success(report) => info!("{} created!", report.dest.display()),
            RunOutcome::Failure(failure) => {
                debug!("{} failed: {}", failure.dest.display(), failure.reason)
            }
        }
        outcome
    }

    fn execute(&self, group: &FileGroup) -> RunOutcome {
        let dest = group.dest.as_path();

        if let Err(reason) = check_destination(group) {
            return RunOutcome::failure(dest, reason, String::new());
        }

        let invocation = build_invocation(self.options, self.location, group);
        debug!("{}", invocation);

        if let Err(reason) = write_placeholder(dest) {
            return RunOutcome::failure(dest, reason, String::new());
        }

        let output = match self.runner.run(&invocation, self.options.timeout()) {
            Ok(output) => output,
            Err(ProcessError::Timeout(limit)) => {
                return RunOutcome::failure(dest, FailureReason::Timeout(limit), String::new())
            }
            Err(e @ ProcessError::Spawn { .. }) => {
                return RunOutcome::failure(dest, FailureReason::Spawn(e.to_string()), String::new())
            }
        };

        let text = output.combined();
        let verdict = match self.options.success_policy() {
            SuccessPolicy::Output if text.is_empty() => Err(FailureReason::NoOutput),
            SuccessPolicy::ExitStatus if !output.success() => {
                Err(FailureReason::ExitStatus(output.exit_code))
            }
            _ => Ok(()),
        };
        if let Err(reason) = verdict {
            return RunOutcome::failure(dest, reason, text);
        }

        if let Err(reason) = append_source_mapping(dest) {
            return RunOutcome::failure(dest, reason, text);
        }

        if let Some(log) = self.log {
            if let Err(e) = log.append(&text) {
                return RunOutcome::failure(dest, filesystem(log.path(), e), text);
            }
        }

        RunOutcome::Success(CompileReport {
            dest: dest.to_path_buf(),
            map_path: map_path(dest),
            output: text,
            duration: output.duration,
            exit_code: output.exit_code,
        })
    }
}

fn filesystem(path: &Path, e: std::io::Error) -> FailureReason {
    FailureReason::Filesystem {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Пустая заглушка на месте выходного файла; создаёт родительские директории.
fn write_placeholder(dest: &Path) -> Result<(), FailureReason> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| filesystem(parent, e))?;
    }
    fs::write(dest, "").map_err(|e| filesystem(dest, e))
}

/// Дописать `//# sourceMappingURL=<name>.map` последней строкой.
fn append_source_mapping(dest: &Path) -> Result<(), FailureReason> {
    let mut content = fs::read(dest).map_err(|e| filesystem(dest, e))?;

    if content.last().is_some_and(|b| *b != b'\n') {
        content.push(b'\n');
    }
    content.extend_from_slice(source_mapping_comment(dest).as_bytes());
    content.push(b'\n');

    fs::write(dest, content).map_err(|e| filesystem(dest, e))
}
