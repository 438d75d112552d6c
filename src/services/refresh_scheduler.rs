//! Refresco periódico de vehículos desactualizados
//!
//! Cada intervalo se seleccionan los vehículos con `last_fetched_at < ahora -
//! stale_after` y se vuelven a agregar uno a uno. Un fallo en un vehículo se
//! registra y no detiene al resto; el vehículo vuelve a ser candidato en el
//! siguiente ciclo. Los ciclos nunca se solapan, y la cancelación se
//! comprueba antes de cada vehículo.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::staleness_selector::{find_stale, StaleVehicle};
use super::vehicle_details_service::VehicleDetailsService;
use crate::config::EnvironmentConfig;
use crate::repositories::VehicleStore;
use crate::utils::clock::Clock;
use crate::utils::errors::AppResult;

/// Configuración del refresco
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Periodo entre ciclos
    pub interval: Duration,
    /// Antigüedad a partir de la cual un vehículo se considera desactualizado
    pub stale_after: chrono::Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            stale_after: chrono::Duration::hours(1),
        }
    }
}

impl From<&EnvironmentConfig> for RefreshConfig {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            // `interval_at` no admite un periodo cero
            interval: Duration::from_secs(config.refresh_interval_secs.max(1)),
            stale_after: config.stale_after,
        }
    }
}

/// Resultado de un ciclo de refresco
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub selected: usize,
    pub refreshed: usize,
    pub failed: usize,
}

pub struct RefreshScheduler {
    store: Arc<dyn VehicleStore>,
    details: Arc<VehicleDetailsService>,
    clock: Arc<dyn Clock>,
    config: RefreshConfig,
}

impl RefreshScheduler {
    pub fn new(
        store: Arc<dyn VehicleStore>,
        details: Arc<VehicleDetailsService>,
        clock: Arc<dyn Clock>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            store,
            details,
            clock,
            config,
        }
    }

    /// Lanzar el bucle en una tarea de tokio
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    /// Ejecutar ciclos hasta que se cancele el token
    ///
    /// El primer ciclo ocurre un intervalo después del arranque. Un ciclo en
    /// curso deja de refrescar en cuanto se cancela el token; la agregación
    /// del vehículo en curso no se interrumpe.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "🔄 Refresco de vehículos iniciado (cada {:?}, antigüedad máxima {}s)",
            self.config.interval,
            self.config.stale_after.num_seconds()
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("🛑 Refresco de vehículos detenido");
                    return;
                }
                _ = ticker.tick() => {
                    self.run_tick_until(&cancel).await;
                }
            }
        }
    }

    /// Un ciclo completo: seleccionar candidatos y refrescarlos en orden
    pub async fn run_tick(&self) -> TickReport {
        self.run_tick_until(&CancellationToken::new()).await
    }

    /// Como `run_tick`, pero los candidatos pendientes se abandonan al cancelar
    ///
    /// `refreshed + failed < selected` indica un ciclo interrumpido.
    pub async fn run_tick_until(&self, cancel: &CancellationToken) -> TickReport {
        let cutoff = self.clock.now() - self.config.stale_after;

        let candidates = match find_stale(self.store.as_ref(), cutoff).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("❌ No se pudieron seleccionar vehículos desactualizados: {}", e);
                return TickReport::default();
            }
        };

        let mut report = TickReport {
            selected: candidates.len(),
            ..TickReport::default()
        };
        if candidates.is_empty() {
            debug!("🔄 Ningún vehículo desactualizado antes de {}", cutoff);
            return report;
        }

        for vehicle in &candidates {
            if cancel.is_cancelled() {
                info!(
                    "🛑 Ciclo de refresco interrumpido: {} vehículos pendientes",
                    report.selected - report.refreshed - report.failed
                );
                break;
            }

            match self.refresh_vehicle(vehicle).await {
                Ok(()) => report.refreshed += 1,
                Err(e) => {
                    warn!(
                        "⚠️ Error refrescando {} ({}): {}",
                        vehicle.registration_number, vehicle.id, e
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            "🔄 Ciclo de refresco: {} seleccionados, {} actualizados, {} fallidos",
            report.selected, report.refreshed, report.failed
        );
        report
    }

    async fn refresh_vehicle(&self, vehicle: &StaleVehicle) -> AppResult<()> {
        let details = self.details.fetch(&vehicle.registration_number).await?;
        self.store.replace(vehicle.id, details).await?;
        debug!("✅ Vehículo {} refrescado", vehicle.registration_number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RefreshConfig::default();
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.stale_after, chrono::Duration::hours(1));
    }
}
