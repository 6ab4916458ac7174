//! Shared fixtures for handler tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use http_body_util::BodyExt;

use occupancy_timer_app::aggregator::AggregatorSettings;
use occupancy_timer_app::event_bus::InProcessEventBus;
use occupancy_timer_app::ports::{SwitchInput, SwitchNotifier};
use occupancy_timer_app::services::accessory_service::AccessoryService;
use occupancy_timer_domain::accessory::AccessoryConfig;
use occupancy_timer_domain::characteristic::Capability;
use occupancy_timer_domain::error::{OccupancyError, ValidationError};
use occupancy_timer_domain::id::{AccessoryId, SwitchId};

use crate::state::AppState;

pub(crate) struct StubSwitch {
    id: SwitchId,
    name: String,
    capability: Capability,
    on: AtomicBool,
    notifier: Mutex<Option<SwitchNotifier>>,
}

impl SwitchInput for StubSwitch {
    fn id(&self) -> SwitchId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> Result<bool, OccupancyError> {
        Ok(self.on.load(Ordering::SeqCst))
    }

    fn attach(&self, notifier: SwitchNotifier) {
        *self.notifier.lock().unwrap() = Some(notifier);
    }

    fn actuate(&self, capability: Capability, on: bool) -> Result<bool, OccupancyError> {
        if capability != self.capability {
            return Err(ValidationError::CapabilityNotExposed { capability }.into());
        }
        self.on.store(on, Ordering::SeqCst);
        if let Some(notifier) = self.notifier.lock().unwrap().as_ref() {
            notifier.notify();
        }
        Ok(on)
    }
}

pub(crate) type TestState = AppState<StubSwitch, Arc<InProcessEventBus>>;

/// Register one accessory per config, backed by stub switches.
pub(crate) fn test_state(configs: &[AccessoryConfig]) -> (TestState, Vec<AccessoryId>) {
    let event_bus = Arc::new(InProcessEventBus::new(64));
    let service = AccessoryService::new(Arc::clone(&event_bus), AggregatorSettings::default());

    let ids = configs
        .iter()
        .map(|config| {
            let switches = config
                .switch_names()
                .into_iter()
                .enumerate()
                .map(|(index, name)| {
                    Arc::new(StubSwitch {
                        id: SwitchId::new(index),
                        name,
                        capability: config.actuation_capability(),
                        on: AtomicBool::new(false),
                        notifier: Mutex::new(None),
                    })
                })
                .collect();
            service.register(config.clone(), switches).unwrap()
        })
        .collect();

    (AppState::new(Arc::new(service), event_bus), ids)
}

pub(crate) async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
