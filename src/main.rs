use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fleet_inspection::config::{EnvironmentConfig, StorageBackend};
use fleet_inspection::routes::create_app_router;
use fleet_inspection::services::completion_events::{
    spawn_performance_observer, HttpPerformanceScorer, LoggingPerformanceScorer,
    PerformanceScorer,
};
use fleet_inspection::{assemble, build_stores, http_client};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    info!("🚗 Fleet Inspection - Recogidas, devoluciones y detección de daños");
    info!("=================================================================");

    let config = EnvironmentConfig::from_env()?;
    if config.storage_backend == StorageBackend::Memory {
        if config.is_production() {
            anyhow::bail!("STORAGE_BACKEND=memory is not allowed in production");
        }
        warn!("⚠️ STORAGE_BACKEND=memory: los datos se pierden al reiniciar");
    }

    let http = http_client(config.http_timeout)?;
    let stores = match build_stores(&config, http.clone()).await {
        Ok(stores) => stores,
        Err(e) => {
            error!("❌ Error inicializando almacenamiento: {}", e);
            return Err(e);
        }
    };

    let scorer: Arc<dyn PerformanceScorer> = match &config.performance_score_url {
        Some(url) => Arc::new(HttpPerformanceScorer::new(http, url.clone())),
        None => Arc::new(LoggingPerformanceScorer),
    };

    let addr: SocketAddr = config.server_url().parse()?;
    let (state, events) = assemble(config, stores);
    let observer = spawn_performance_observer(events, scorer);
    let app = create_app_router(state);

    info!("🚀 Servidor escuchando en http://{}", addr);
    info!("   PUT  /api/reservations/:id/inspections/:type/draft");
    info!("   POST /api/reservations/:id/inspections/:type/complete");
    info!("   GET  /api/reservations/:id/damage-compare");
    info!("   POST /api/damage-detections");
    info!("   POST /api/damage-detections/:id/verify");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
    }

    // El router (y con él el emisor de eventos) ya se ha soltado
    if let Err(e) = observer.await {
        error!("❌ Observador de puntuación terminó con error: {}", e);
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el manejador de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el manejador de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
