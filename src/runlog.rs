//! Append-only compiler log (`closure.log`).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Журнал вывода компилятора.
///
/// Все записи проходят через один мьютекс, поэтому параллельные группы
/// не перемешивают вывод. Разделители между записями не добавляются:
/// журнал растёт ровно на длину записанного текста.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Дописать текст в конец журнала, создав файл при необходимости.
    pub fn append(&self, text: &str) -> std::io::Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_append_creates_and_grows() {
        let dir = tempdir().unwrap();
        let log = RunLog::new(dir.path().join("closure.log"));

        log.append("first run\n").unwrap();
        log.append("second").unwrap();

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, "first run\nsecond");
    }

    #[test]
    fn test_append_keeps_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("closure.log");
        fs::write(&path, "previous").unwrap();

        RunLog::new(&path).append(" next").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous next");
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempdir().unwrap();
        let log = Arc::new(RunLog::new(dir.path().join("logs/closure.log")));
        let entry = "x".repeat(4096);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let log = Arc::clone(&log);
                let entry = entry.clone();
                thread::spawn(move || log.append(&entry).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = fs::read_to_string(log.path()).unwrap();
        assert_eq!(content.len(), 8 * 4096);
    }
}
