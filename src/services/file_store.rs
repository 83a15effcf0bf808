//! Almacén de ficheros de fotos e imágenes generadas
//!
//! URLs relativas (`/uploads/...`) se resuelven contra el directorio local
//! de subidas; URLs absolutas `http(s)://` se descargan con reqwest.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Lee los bytes de una foto por su URL
    async fn read(&self, url: &str) -> Result<Vec<u8>, FileStoreError>;

    /// Guarda un fichero generado y devuelve su URL pública
    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<String, FileStoreError>;
}

/// Directorio local de subidas servido bajo un prefijo público
pub struct LocalFileStore {
    root: PathBuf,
    public_prefix: String,
    http: reqwest::Client,
}

impl LocalFileStore {
    /// `http` debe llevar timeout (ver `crate::http_client`)
    pub fn new(
        root: impl Into<PathBuf>,
        public_prefix: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Ruta relativa segura (sin `..` ni raíces)
    fn relative_path(value: &str) -> Result<PathBuf, FileStoreError> {
        let relative = Path::new(value.trim_start_matches('/'));
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || relative.as_os_str().is_empty() {
            return Err(FileStoreError::InvalidPath(value.to_string()));
        }
        Ok(relative.to_path_buf())
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, FileStoreError> {
        let relative = url.strip_prefix(&self.public_prefix).unwrap_or(url);
        Ok(self.root.join(Self::relative_path(relative)?))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn read(&self, url: &str) -> Result<Vec<u8>, FileStoreError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            debug!("🌐 Descargando foto remota {}", url);
            let response = self.http.get(url).send().await?;
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Err(FileStoreError::NotFound(url.to_string()));
            }
            let bytes = response.error_for_status()?.bytes().await?;
            return Ok(bytes.to_vec());
        }

        let path = self.resolve(url)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FileStoreError::NotFound(url.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<String, FileStoreError> {
        let relative = Self::relative_path(key)?;
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        Ok(format!("{}/{}", self.public_prefix, key.trim_start_matches('/')))
    }
}

/// Almacén en memoria, útil en tests
#[derive(Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        if let Ok(mut files) = self.files.write() {
            files.insert(url.into(), bytes);
        }
    }

    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.files.read().ok().and_then(|files| files.get(url).cloned())
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn read(&self, url: &str) -> Result<Vec<u8>, FileStoreError> {
        self.get(url).ok_or_else(|| FileStoreError::NotFound(url.to_string()))
    }

    async fn write(&self, key: &str, bytes: Vec<u8>) -> Result<String, FileStoreError> {
        let url = format!("/uploads/{}", key.trim_start_matches('/'));
        self.insert(url.clone(), bytes);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_relative_path_rejects_traversal() {
        assert!(LocalFileStore::relative_path("inspections/a.jpg").is_ok());
        assert!(LocalFileStore::relative_path("../etc/passwd").is_err());
        assert!(LocalFileStore::relative_path("inspections/../../x").is_err());
        assert!(LocalFileStore::relative_path("").is_err());
    }

    #[tokio::test]
    async fn test_local_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "/uploads/", reqwest::Client::new());

        let url = store
            .write("damage-detections/diff.png", vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(url, "/uploads/damage-detections/diff.png");
        assert_eq!(store.read(&url).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_local_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path(), "/uploads", reqwest::Client::new());
        let result = store.read("/uploads/inspections/missing.jpg").await;
        assert!(matches!(result, Err(FileStoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remote_read_gives_up_on_silent_host() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let client = crate::http_client(Duration::from_millis(200)).unwrap();
        let store = LocalFileStore::new(dir.path(), "/uploads", client);

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            store.read(&format!("http://{}/photo.jpg", addr)),
        )
        .await
        .expect("remote read must not hang");
        assert!(matches!(result, Err(FileStoreError::Http(_))));
    }
}
