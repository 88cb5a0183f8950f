//! Fixtures for transport-level tests
//!
//! [`install_plants`] registers a real and a predictive thermal plant on a
//! [`MemoryBus`], answering on the production topics the way the external
//! simulators do.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use heattwin_connectors::MemoryBus;
use heattwin_core::constants::topics;
use heattwin_core::messages::{PlantCommand, RealPlantCommand};
use heattwin_core::{Readings, Sensor, Zone};

/// Outside temperature reported by the plants (°C)
pub const ENVIRONMENT_C: f64 = 15.0;

/// Request counters of the installed plants
#[derive(Debug, Clone, Default)]
pub struct PlantCounters {
    pub real: Arc<AtomicUsize>,
    pub predicted: Arc<AtomicUsize>,
}

impl PlantCounters {
    pub fn real(&self) -> usize {
        self.real.load(Ordering::SeqCst)
    }

    pub fn predicted(&self) -> usize {
        self.predicted.load(Ordering::SeqCst)
    }
}

/// One explicit Euler step of the three-zone model
pub fn simulate(command: &PlantCommand, environment: f64) -> Readings {
    let params = &command.parameters;
    let current = &command.current_temperatures;
    let mut reply = Readings::new();

    for zone in Zone::ALL {
        let name = zone.as_str();
        let (Some(temp), Some(&capacity), Some(&external)) = (
            current.zone(zone),
            params.capacity.get(name),
            params.heat_transfer_external.get(name),
        ) else {
            continue;
        };
        let couplings = params.heat_transfer_zones.get(name);
        let coupling_sum: f64 = couplings.map_or(0.0, |c| c.values().sum());
        let neighbour_gain: f64 = couplings.map_or(0.0, |c| {
            c.iter().map(|(nbr, k)| k * current.get(nbr).unwrap_or(0.0)).sum()
        });
        let flux = command.heater_status.power(zone) + external * environment + neighbour_gain
            - temp * (external + coupling_sum);
        reply.insert(name, temp + command.delta_t / capacity * flux);
    }

    if let (Some(z1), Some(z2), Some(z3)) = (reply.zone(Zone::Z1), reply.zone(Zone::Z2), reply.zone(Zone::Z3)) {
        reply.insert(Sensor::TA.as_str(), z1);
        reply.insert(Sensor::TB.as_str(), (z1 + z2) / 2.0);
        reply.insert(Sensor::TC.as_str(), (z2 + z3) / 2.0);
        reply.insert(Sensor::TD.as_str(), z3);
    }
    reply.insert("environment", environment);
    reply
}

/// Answer both plant topic pairs on `bus`
pub fn install_plants(bus: &MemoryBus) -> PlantCounters {
    let counters = PlantCounters::default();

    let real = Arc::clone(&counters.real);
    bus.respond(topics::HEATER_STATUS, topics::SIMULATION_TEMPERATURES, move |payload| {
        real.fetch_add(1, Ordering::SeqCst);
        let request: RealPlantCommand = serde_json::from_slice(payload).ok()?;
        serde_json::to_vec(&simulate(&request.command, ENVIRONMENT_C)).ok()
    });

    let predicted = Arc::clone(&counters.predicted);
    bus.respond(topics::HEATER_SIMULATION, topics::CONTROLLER_SIMULATION_TEMPERATURES, move |payload| {
        predicted.fetch_add(1, Ordering::SeqCst);
        let request: PlantCommand = serde_json::from_slice(payload).ok()?;
        serde_json::to_vec(&simulate(&request, ENVIRONMENT_C)).ok()
    });

    counters
}
