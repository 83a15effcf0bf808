//! Contexto de tenant
//!
//! La autenticación ocurre aguas arriba; el gateway reenvía el tenant y el
//! usuario resueltos en las cabeceras `X-Tenant-Id` y `X-User-Id`.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::utils::errors::AppError;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";

/// Tenant y usuario de la petición actual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
}

fn header_uuid(headers: &HeaderMap, name: &str) -> Result<Uuid, AppError> {
    let value = headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("Missing {} header", name)))?;

    Uuid::parse_str(value.trim())
        .map_err(|_| AppError::Unauthorized(format!("Invalid {} header", name)))
}

impl TenantContext {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        Ok(Self {
            tenant_id: header_uuid(headers, TENANT_HEADER)?,
            user_id: header_uuid(headers, USER_HEADER)?,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        TenantContext::from_headers(&parts.headers)
    }
}
