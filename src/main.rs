use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vehicle_tracker::{
    clients::{MotHistoryClient, VesClient},
    config::{DatabaseConfig, EnvironmentConfig},
    database::DatabaseConnection,
    middleware::cors_layer,
    repositories::{PgVehicleStore, VehicleStore},
    routes::create_app_router,
    services::{RefreshConfig, RefreshScheduler, VehicleDetailsService},
    state::AppState,
    utils::{clock::{Clock, SystemClock}, jwt::JwtConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env().context("Configuración inválida")?;

    // Configurar logging; RUST_LOG tiene prioridad sobre el nivel por entorno
    let default_level = if config.is_development() { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    info!("🚗 Vehicle Tracker - VES + MOT History");
    info!("======================================");

    // Inicializar base de datos
    let db_connection = match DatabaseConnection::new(&DatabaseConfig::new(config.database_url.clone())).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };
    let store: Arc<dyn VehicleStore> = Arc::new(PgVehicleStore::new(db_connection.pool().clone()));

    // Clientes de los proveedores
    let ves_client = VesClient::new(
        config.ves_api_key.clone(),
        config.ves_api_url.clone(),
        config.provider_timeout(),
    )?;
    let mot_history_client = MotHistoryClient::new(
        config.mot_history_api_key.clone(),
        config.mot_history_api_url.clone(),
        config.provider_timeout(),
    )?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let vehicle_details = Arc::new(VehicleDetailsService::new(
        Arc::new(ves_client),
        Arc::new(mot_history_client),
        clock.clone(),
    ));

    // Refresco en segundo plano
    let cancel = CancellationToken::new();
    let scheduler = RefreshScheduler::new(
        store.clone(),
        vehicle_details.clone(),
        clock,
        RefreshConfig::from(&config),
    );
    let scheduler_handle = scheduler.spawn(cancel.clone());

    let app_state = AppState::new(store, vehicle_details, JwtConfig::from(&config));
    let app = create_app_router(app_state, cors_layer(&config.cors_origins));

    let addr: SocketAddr = config.server_url().parse()?;
    info!("🌐 Servidor iniciando en http://{} ({})", addr, config.environment);
    info!("🔍 Endpoints disponibles:");
    info!("   GET    /health - Health check");
    info!("   POST   /api/vehicles - Registrar vehículo");
    info!("   GET    /api/vehicles - Listar vehículos");
    info!("   GET    /api/vehicles/:registration - Obtener vehículo");
    info!("   DELETE /api/vehicles/:registration - Eliminar vehículo");
    info!("   POST   /api/vehicles/:registration/refresh - Refrescar vehículo");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let shutdown = cancel.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown.cancel();
        })
        .await;

    // Detener el refresco también si el servidor terminó por error
    cancel.cancel();
    if let Err(e) = scheduler_handle.await {
        error!("❌ La tarea de refresco terminó con error: {}", e);
    }

    if let Err(e) = served {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
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
                error!("❌ No se pudo escuchar SIGTERM: {}", e);
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
