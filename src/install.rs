//! Closure Compiler installer.
//!
//! Скачивает архив фиксированной версии и распаковывает из него только
//! `.jar`-файлы в директорию установки.

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::ZipArchive;

/// Версия компилятора по умолчанию.
pub const COMPILER_VERSION: &str = "20150126";

/// Базовый URL загрузки.
pub const DOWNLOAD_BASE: &str = "https://dl.google.com/closure-compiler";

/// Извлекаемое расширение.
pub const JAR_EXTENSION: &str = ".jar";

/// URL архива для версии.
pub fn download_url(version: &str) -> String {
    format!("{}/compiler-{}.zip", DOWNLOAD_BASE, version)
}

/// Ошибки установщика.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Download fail: {0}")]
    Network(String),

    #[error("Download fail: HTTP {0}")]
    Http(u16),

    #[error("Extract error: {0}")]
    Extract(String),

    #[error("Archive contains no .jar files")]
    NoJarInArchive,

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Установщик компилятора.
pub struct Installer {
    /// Директория установки
    install_dir: PathBuf,
    /// Версия
    version: String,
    /// Ожидаемый SHA-256 архива
    checksum: Option<String>,
    /// Показывать прогресс
    progress: bool,
}

impl Installer {
    /// Создать установщик.
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
            version: COMPILER_VERSION.to_string(),
            checksum: None,
            progress: true,
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn checksum(mut self, checksum: Option<&str>) -> Self {
        self.checksum = checksum.map(|c| c.trim().to_ascii_lowercase());
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Скачать, проверить и распаковать.
    pub fn install(&self) -> Result<Vec<PathBuf>, InstallError> {
        let url = download_url(&self.version);
        info!("Downloading {}", url);

        let data = self.download(&url)?;
        self.verify(&data)?;
        let jars = self.unpack(&data)?;

        info!("Finished extracting {} file(s)", jars.len());
        Ok(jars)
    }

    /// Скачать архив в память.
    fn download(&self, url: &str) -> Result<Vec<u8>, InstallError> {
        let mut response =
            reqwest::blocking::get(url).map_err(|e| InstallError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(InstallError::Http(response.status().as_u16()));
        }

        let total = response.content_length().unwrap_or(0);
        let pb = if self.progress {
            let pb = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("  Downloading Closure Compiler [{bar:20}] {percent}% {eta}")
            {
                pb.set_style(style.progress_chars("= "));
            }
            Some(pb)
        } else {
            None
        };

        let mut data = Vec::with_capacity(total as usize);
        let mut chunk = [0u8; 16 * 1024];
        loop {
            let n = response
                .read(&mut chunk)
                .map_err(|e| InstallError::Network(e.to_string()))?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);
            if let Some(ref pb) = pb {
                pb.inc(n as u64);
            }
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        debug!("Downloaded {} bytes", data.len());
        Ok(data)
    }

    /// Проверить SHA-256, если он задан.
    fn verify(&self, data: &[u8]) -> Result<(), InstallError> {
        if let Some(expected) = &self.checksum {
            let actual = compute_checksum(data);
            if &actual != expected {
                return Err(InstallError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Распаковать `.jar`-файлы в директорию установки.
    pub fn unpack(&self, data: &[u8]) -> Result<Vec<PathBuf>, InstallError> {
        extract_jars(data, &self.install_dir)
    }
}

/// SHA-256 в hex.
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Извлечь из zip-архива файлы с расширением `.jar`.
pub fn extract_jars(data: &[u8], dest: &Path) -> Result<Vec<PathBuf>, InstallError> {
    let mut archive =
        ZipArchive::new(Cursor::new(data)).map_err(|e| InstallError::Extract(e.to_string()))?;

    let mut extracted = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| InstallError::Extract(e.to_string()))?;

        if file.is_dir() || !file.name().ends_with(JAR_EXTENSION) {
            continue;
        }

        let outpath = match file.enclosed_name() {
            Some(path) => dest.join(path),
            None => continue,
        };

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = fs::File::create(&outpath)?;
        std::io::copy(&mut file, &mut outfile)?;

        debug!("Extracted {}", outpath.display());
        extracted.push(outpath);
    }

    if extracted.is_empty() {
        return Err(InstallError::NoJarInArchive);
    }

    Ok(extracted)
}
