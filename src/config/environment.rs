//! Configuración de variables de entorno
//!
//! Este módulo carga la configuración del servicio desde el entorno
//! (previamente poblado con `.env` por dotenvy).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Backend de almacenamiento de los repositorios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl StorageBackend {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'", other),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: Option<String>,
    pub storage_backend: StorageBackend,
    pub uploads_dir: PathBuf,
    pub uploads_public_prefix: String,
    pub performance_score_url: Option<String>,
    /// Timeout de las llamadas HTTP salientes
    pub http_timeout: Duration,
    pub cors_origins: Vec<String>,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

impl EnvironmentConfig {
    pub fn from_env() -> Result<Self> {
        let port = var_or("PORT", "3000")
            .parse()
            .context("PORT must be a valid number")?;
        let http_timeout_secs: u64 = var_or("HTTP_TIMEOUT_SECS", "10")
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a valid number")?;
        let storage_backend = StorageBackend::parse(&var_or("STORAGE_BACKEND", "postgres"))?;
        let database_url = optional_var("DATABASE_URL");

        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORAGE_BACKEND=postgres");
        }

        Ok(Self {
            environment: var_or("ENVIRONMENT", "development"),
            port,
            host: var_or("HOST", "0.0.0.0"),
            database_url,
            storage_backend,
            uploads_dir: PathBuf::from(var_or("UPLOADS_DIR", "./uploads")),
            uploads_public_prefix: var_or("UPLOADS_PUBLIC_PREFIX", "/uploads"),
            performance_score_url: optional_var("PERFORMANCE_SCORE_URL"),
            http_timeout: Duration::from_secs(http_timeout_secs),
            cors_origins: optional_var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Configuración para tests y modo demo, sin base de datos
    pub fn in_memory(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            environment: "test".to_string(),
            port: 0,
            host: "127.0.0.1".to_string(),
            database_url: None,
            storage_backend: StorageBackend::Memory,
            uploads_dir: uploads_dir.into(),
            uploads_public_prefix: "/uploads".to_string(),
            performance_score_url: None,
            http_timeout: Duration::from_secs(10),
            cors_origins: Vec::new(),
        }
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!(StorageBackend::parse("postgres").unwrap(), StorageBackend::Postgres);
        assert_eq!(StorageBackend::parse(" Memory ").unwrap(), StorageBackend::Memory);
        assert!(StorageBackend::parse("redis").is_err());
    }

    #[test]
    fn test_in_memory_config() {
        let config = EnvironmentConfig::in_memory("/tmp/uploads");
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert!(config.database_url.is_none());
        assert_eq!(config.server_url(), "127.0.0.1:0");
        assert!(!config.is_production());
        assert_eq!(config.http_timeout, Duration::from_secs(10));
    }
}
