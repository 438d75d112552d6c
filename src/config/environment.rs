//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno: servidor, base de datos,
//! JWT, credenciales de los dos proveedores y tiempos del refresco.

use anyhow::{anyhow, Context, Result};
use std::{env, str::FromStr, time::Duration};

use crate::clients::{mot_history_client::DEFAULT_MOT_HISTORY_API_URL, ves_client::DEFAULT_VES_API_URL};

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub cors_origins: Vec<String>,
    // Proveedores externos
    pub ves_api_key: String,
    pub ves_api_url: String,
    pub mot_history_api_key: String,
    pub mot_history_api_url: String,
    pub provider_timeout_secs: u64,
    // Refresco en segundo plano
    pub refresh_interval_secs: u64,
    pub stale_after: chrono::Duration,
}

impl EnvironmentConfig {
    /// Leer la configuración de las variables de entorno
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construir la configuración a partir de una función de búsqueda de claves
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };
        let or_default = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            environment: or_default("ENVIRONMENT", "development"),
            port: parse_or(&lookup, "PORT", 4000)?,
            host: or_default("HOST", "0.0.0.0"),
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_issuer: lookup("JWT_ISSUER").filter(|value| !value.trim().is_empty()),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            ves_api_key: required("VES_API_KEY")?,
            ves_api_url: or_default("VES_API_URL", DEFAULT_VES_API_URL),
            mot_history_api_key: required("MOT_HISTORY_API_KEY")?,
            mot_history_api_url: or_default("MOT_HISTORY_API_URL", DEFAULT_MOT_HISTORY_API_URL),
            provider_timeout_secs: parse_or(&lookup, "PROVIDER_TIMEOUT_SECS", 60)?,
            refresh_interval_secs: parse_or(&lookup, "REFRESH_INTERVAL_SECS", 60)?,
            stale_after: parse_stale_after(&lookup)?,
        })
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Timeout de cada petición a un proveedor
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

/// `STALE_AFTER_SECS` como `chrono::Duration`; negativos o fuera de rango se rechazan
fn parse_stale_after<F>(lookup: &F) -> Result<chrono::Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: i64 = parse_or(lookup, "STALE_AFTER_SECS", 3600)?;
    if secs < 0 {
        return Err(anyhow!("STALE_AFTER_SECS must not be negative"));
    }
    chrono::Duration::try_seconds(secs).context("STALE_AFTER_SECS is out of range")
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).filter(|value| !value.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}
