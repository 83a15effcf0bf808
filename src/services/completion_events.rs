//! Eventos de cierre de inspección
//!
//! El flujo publica un evento tras el commit; un observador separado lo
//! reenvía al servicio de puntuación de personal. Los fallos del observador
//! solo se registran y nunca afectan al cierre.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::InspectionType;

/// Eventos en cola como máximo; por encima se descartan con aviso
pub const EVENT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InspectionEvent {
    Completed {
        tenant_id: Uuid,
        reservation_id: Uuid,
        inspection_type: InspectionType,
        completed_by: Uuid,
        completed_at: DateTime<Utc>,
    },
}

/// Lado emisor del canal de eventos
#[derive(Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<InspectionEvent>,
}

impl EventPublisher {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<InspectionEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Nunca bloquea el cierre: con la cola llena el evento se pierde
    pub fn publish(&self, event: InspectionEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!("⚠️ Cola de eventos llena, evento descartado: {:?}", event);
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!(
                    "⚠️ Evento de inspección descartado, observador detenido: {:?}",
                    event
                );
            }
        }
    }
}

/// Colaborador externo de puntuación de personal
#[async_trait]
pub trait PerformanceScorer: Send + Sync {
    async fn recalculate(&self, tenant_id: Uuid, user_id: Uuid) -> anyhow::Result<()>;
}

/// Notifica al servicio de puntuación por HTTP
pub struct HttpPerformanceScorer {
    client: reqwest::Client,
    url: String,
}

impl HttpPerformanceScorer {
    /// `client` debe llevar timeout (ver `crate::http_client`)
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl PerformanceScorer for HttpPerformanceScorer {
    async fn recalculate(&self, tenant_id: Uuid, user_id: Uuid) -> anyhow::Result<()> {
        self.client
            .post(&self.url)
            .json(&serde_json::json!({ "tenant_id": tenant_id, "user_id": user_id }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Sin servicio configurado: solo deja constancia en el log
pub struct LoggingPerformanceScorer;

#[async_trait]
impl PerformanceScorer for LoggingPerformanceScorer {
    async fn recalculate(&self, tenant_id: Uuid, user_id: Uuid) -> anyhow::Result<()> {
        log::info!(
            "📊 Recalculo de puntuación omitido (sin servicio) tenant={} user={}",
            tenant_id,
            user_id
        );
        Ok(())
    }
}

/// Lanza el observador que consume los eventos de cierre
pub fn spawn_performance_observer(
    mut rx: mpsc::Receiver<InspectionEvent>,
    scorer: Arc<dyn PerformanceScorer>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let InspectionEvent::Completed {
                tenant_id,
                reservation_id,
                inspection_type,
                completed_by,
                ..
            } = event;

            if let Err(e) = scorer.recalculate(tenant_id, completed_by).await {
                log::warn!(
                    "⚠️ Error recalculando puntuación tras {} de reserva {}: {}",
                    inspection_type,
                    reservation_id,
                    e
                );
            }
        }
        log::info!("👋 Observador de puntuación detenido");
    })
}
