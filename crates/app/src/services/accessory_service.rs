//! Accessory service — hosts any number of independent occupancy
//! accessories, each backed by its own aggregator task.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::task::JoinHandle;

use occupancy_timer_domain::accessory::{AccessoryConfig, AccessoryStatus, SwitchStatus};
use occupancy_timer_domain::characteristic::Capability;
use occupancy_timer_domain::delay::Delay;
use occupancy_timer_domain::error::{NotFoundError, OccupancyError, ValidationError};
use occupancy_timer_domain::id::AccessoryId;

use crate::aggregator::{AggregatorHandle, AggregatorSettings, OccupancyAggregator};
use crate::ports::{EventPublisher, ReconfigurationPort, SwitchInput};

struct Accessory<S> {
    id: AccessoryId,
    config: AccessoryConfig,
    switches: Vec<Arc<S>>,
    handle: AggregatorHandle,
    task: JoinHandle<()>,
}

/// The parts of an accessory needed outside the lock.
struct AccessoryRef<S> {
    id: AccessoryId,
    config: AccessoryConfig,
    switches: Vec<Arc<S>>,
    handle: AggregatorHandle,
}

/// Application service for registering, actuating and reconfiguring
/// occupancy accessories.
pub struct AccessoryService<S, P> {
    publisher: P,
    settings: AggregatorSettings,
    accessories: RwLock<Vec<Accessory<S>>>,
}

impl<S, P> AccessoryService<S, P>
where
    S: SwitchInput + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    /// Create an empty service. Every aggregator publishes through a clone
    /// of `publisher`.
    pub fn new(publisher: P, settings: AggregatorSettings) -> Self {
        Self {
            publisher,
            settings,
            accessories: RwLock::new(Vec::new()),
        }
    }

    /// Register an accessory and start its aggregator.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError::Validation`] when the configuration is
    /// invalid, the name is already taken, or the number of switches does
    /// not match `config.slave_count`.
    pub fn register(
        &self,
        config: AccessoryConfig,
        switches: Vec<Arc<S>>,
    ) -> Result<AccessoryId, OccupancyError> {
        config.validate()?;
        if switches.len() != config.slave_count {
            return Err(ValidationError::SwitchCountMismatch {
                expected: config.slave_count,
                actual: switches.len(),
            }
            .into());
        }

        let mut accessories = self.write_lock();
        if accessories.iter().any(|a| a.config.name == config.name) {
            return Err(ValidationError::DuplicateName(config.name).into());
        }

        let id = AccessoryId::new();
        let (handle, task) = OccupancyAggregator::spawn(
            id,
            &config,
            switches.clone(),
            self.publisher.clone(),
            self.settings,
        );
        tracing::info!(
            %id,
            name = %config.name,
            switches = config.slave_count,
            delay = %config.delay,
            protected_mode = config.protected_mode,
            "accessory registered"
        );
        accessories.push(Accessory {
            id,
            config,
            switches,
            handle,
            task,
        });
        Ok(id)
    }

    /// Status of every accessory, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError::Unavailable`] if an aggregator has stopped.
    pub async fn list(&self) -> Result<Vec<AccessoryStatus>, OccupancyError> {
        let refs: Vec<_> = self.read_lock().iter().map(Self::to_ref).collect();
        let mut statuses = Vec::with_capacity(refs.len());
        for accessory in refs {
            statuses.push(self.status(accessory).await?);
        }
        Ok(statuses)
    }

    /// Status of one accessory.
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError::NotFound`] for an unknown id, or
    /// [`OccupancyError::Unavailable`] if its aggregator has stopped.
    pub async fn get(&self, id: AccessoryId) -> Result<AccessoryStatus, OccupancyError> {
        let accessory = self.lookup(id)?;
        self.status(accessory).await
    }

    /// Actuate switch `index` of accessory `id`.
    ///
    /// `capability` defaults to the one the accessory exposes for its mode.
    /// The switch notifies the aggregator itself; this returns as soon as
    /// the value is stored.
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError::NotFound`] for an unknown id, or
    /// [`OccupancyError::Validation`] for an out-of-range index or a
    /// capability the switch does not expose.
    pub fn set_switch(
        &self,
        id: AccessoryId,
        index: usize,
        capability: Option<Capability>,
        on: bool,
    ) -> Result<bool, OccupancyError> {
        let accessory = self.lookup(id)?;
        let switch = accessory.switches.get(index).ok_or_else(|| {
            ValidationError::SwitchOutOfRange {
                index,
                count: accessory.switches.len(),
            }
        })?;
        let capability = capability.unwrap_or_else(|| accessory.config.actuation_capability());
        tracing::debug!(accessory = %accessory.config.name, index, %capability, on, "actuating switch");
        switch.actuate(capability, on)
    }

    /// Change the release delay of accessory `id`.
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError::NotFound`] for an unknown id, or
    /// [`OccupancyError::Unavailable`] if its aggregator has stopped.
    pub async fn reconfigure(
        &self,
        id: AccessoryId,
        delay_seconds: i64,
    ) -> Result<Delay, OccupancyError> {
        let accessory = self.lookup(id)?;
        accessory.handle.reconfigure(delay_seconds).await
    }

    /// Tear down accessory `id`, cancelling any running countdown.
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError::NotFound`] for an unknown id.
    pub async fn remove(&self, id: AccessoryId) -> Result<(), OccupancyError> {
        let accessory = {
            let mut accessories = self.write_lock();
            let position = accessories
                .iter()
                .position(|a| a.id == id)
                .ok_or_else(|| not_found(id))?;
            accessories.remove(position)
        };
        Self::stop(accessory).await;
        Ok(())
    }

    /// Tear down every accessory.
    pub async fn shutdown(&self) {
        let accessories = std::mem::take(&mut *self.write_lock());
        for accessory in accessories {
            Self::stop(accessory).await;
        }
    }

    async fn stop(accessory: Accessory<S>) {
        accessory.handle.shutdown();
        if let Err(err) = accessory.task.await {
            tracing::warn!(%err, name = %accessory.config.name, "aggregator task ended abnormally");
        }
        tracing::info!(id = %accessory.id, name = %accessory.config.name, "accessory removed");
    }

    async fn status(&self, accessory: AccessoryRef<S>) -> Result<AccessoryStatus, OccupancyError> {
        let occupancy = accessory.handle.snapshot().await?;
        let capability = accessory.config.actuation_capability();

        let mut switches = Vec::with_capacity(accessory.switches.len());
        for switch in &accessory.switches {
            let on = match tokio::time::timeout(self.settings.read_timeout, switch.read()).await {
                Ok(Ok(on)) => Some(on),
                Ok(Err(err)) => {
                    tracing::debug!(%err, "switch did not answer status read");
                    None
                }
                Err(_) => None,
            };
            switches.push(SwitchStatus {
                id: switch.id(),
                name: switch.name().to_string(),
                on,
                capability,
            });
        }

        Ok(AccessoryStatus {
            id: accessory.id,
            name: accessory.config.name,
            protected_mode: accessory.config.protected_mode,
            occupancy,
            switches,
        })
    }

    fn lookup(&self, id: AccessoryId) -> Result<AccessoryRef<S>, OccupancyError> {
        self.read_lock()
            .iter()
            .find(|a| a.id == id)
            .map(Self::to_ref)
            .ok_or_else(|| not_found(id))
    }

    fn to_ref(accessory: &Accessory<S>) -> AccessoryRef<S> {
        AccessoryRef {
            id: accessory.id,
            config: accessory.config.clone(),
            switches: accessory.switches.clone(),
            handle: accessory.handle.clone(),
        }
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, Vec<Accessory<S>>> {
        self.accessories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Vec<Accessory<S>>> {
        self.accessories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(id: AccessoryId) -> OccupancyError {
    NotFoundError {
        entity: "Accessory",
        id: id.to_string(),
    }
    .into()
}
