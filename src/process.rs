//! External process execution.
//!
//! Команда передаётся вектором аргументов, без командной оболочки:
//! пути с пробелами и спецсимволами остаются одним аргументом.

use std::fmt;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Интервал опроса процесса при заданном тайм-ауте.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Одна команда: программа и её аргументы.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// `<java> [jvm_flags...] -jar <compiler> <flags...>`
    pub fn java_jar(java: &str, jvm_flags: &[String], jar: &Path, flags: Vec<String>) -> Self {
        let mut args = Vec::with_capacity(jvm_flags.len() + flags.len() + 2);
        args.extend(jvm_flags.iter().cloned());
        args.push("-jar".to_string());
        args.push(jar.to_string_lossy().into_owned());
        args.extend(flags);

        Self {
            program: java.to_string(),
            args,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Результат завершившегося процесса.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Код возврата (`None`, если процесс убит сигналом)
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    /// stdout, затем stderr.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len());
        text.push_str(&self.stdout);
        text.push_str(&self.stderr);
        text
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Ошибки запуска процесса.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to start `{program}`: {message}")]
    Spawn { program: String, message: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Исполнитель внешних команд.
///
/// `Sync`, чтобы конвейер мог вызывать его из нескольких потоков.
pub trait ProcessRunner: Sync {
    fn run(
        &self,
        invocation: &Invocation,
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, ProcessError>;
}

/// Исполнитель на `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(
        &self,
        invocation: &Invocation,
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, ProcessError> {
        let started = Instant::now();
        let spawn_error = |e: std::io::Error| ProcessError::Spawn {
            program: invocation.program.clone(),
            message: e.to_string(),
        };

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_error)?;

        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let status = match timeout {
            None => match child.wait() {
                Ok(status) => status,
                Err(e) => {
                    reap(&mut child);
                    return Err(spawn_error(e));
                }
            },
            Some(limit) => wait_with_deadline(&mut child, started + limit)
                .map_err(spawn_error)?
                .ok_or(ProcessError::Timeout(limit))?,
        };

        Ok(ProcessOutput {
            exit_code: status.code(),
            stdout: join_reader(stdout),
            stderr: join_reader(stderr),
            duration: started.elapsed(),
        })
    }
}

/// Управление запущенным процессом.
trait ChildProcess {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>>;
    fn kill(&mut self) -> io::Result<()>;
    fn wait(&mut self) -> io::Result<ExitStatus>;
}

impl ChildProcess for Child {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Child::try_wait(self)
    }

    fn kill(&mut self) -> io::Result<()> {
        Child::kill(self)
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        Child::wait(self)
    }
}

/// Дождаться процесса до `deadline`; по истечении убить и вернуть `None`.
///
/// При любой ошибке процесс убивается до возврата ошибки.
fn wait_with_deadline<C: ChildProcess>(
    child: &mut C,
    deadline: Instant,
) -> io::Result<Option<ExitStatus>> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {}
            Err(e) => {
                reap(child);
                return Err(e);
            }
        }
        if Instant::now() >= deadline {
            if let Err(e) = child.kill() {
                // Процесс мог завершиться сам; забрать его без блокировки.
                let _ = child.try_wait();
                return Err(e);
            }
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Убить и дождаться процесса, игнорируя ошибки.
fn reap<C: ChildProcess>(child: &mut C) {
    if child.kill().is_ok() {
        let _ = child.wait();
    } else {
        let _ = child.try_wait();
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        // Обрыв канала означает лишь конец вывода.
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
