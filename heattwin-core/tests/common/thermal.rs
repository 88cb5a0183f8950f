//! In-process thermal plant
//!
//! Advances each zone by one explicit Euler step of
//!
//! ```text
//! T' = T + Δt/C · (P + k_ext·T_env + Σ k_n·T_n − T·(k_ext + Σ k_n))
//! ```
//!
//! using the parameter set carried by the request, exactly like the external
//! simulators do. The real and the predictive plant differ only in which
//! parameters they are sent.

use heattwin_core::messages::{PlantCommand, RealPlantCommand};
use heattwin_core::{Plant, Readings, Sensor, Zone};

/// Outside temperature reported by the fixture (°C)
pub const ENVIRONMENT_C: f64 = 15.0;

/// One simulated step; zones missing from the request are left out of the reply
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

        let power = command.heater_status.power(zone);
        let gain = external * environment + neighbour_gain;
        let loss = temp * (external + coupling_sum);
        reply.insert(name, temp + command.delta_t / capacity * (power + gain - loss));
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

/// Plant answering both query kinds in-process
#[derive(Debug, Default)]
pub struct ThermalPlant {
    /// Real-plant requests received
    pub real_requests: Vec<RealPlantCommand>,
    /// Predictive requests received
    pub predicted_requests: usize,
    /// When set, the real plant stops answering from this request index on
    pub silent_after: Option<usize>,
}

impl ThermalPlant {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plant for ThermalPlant {
    fn query_real(&mut self, command: &RealPlantCommand) -> Readings {
        let index = self.real_requests.len();
        self.real_requests.push(command.clone());
        match self.silent_after {
            Some(limit) if index >= limit => Readings::new(),
            _ => simulate(&command.command, ENVIRONMENT_C),
        }
    }

    fn query_predicted(&mut self, command: &PlantCommand) -> Readings {
        self.predicted_requests += 1;
        simulate(command, ENVIRONMENT_C)
    }
}
