//! Heater Control Loop
//!
//! ## Overview
//!
//! The controller runs one step per `delta_t` of simulated time until the
//! session's stop time. What a step does depends on the [`PolicyKind`] chosen
//! at startup:
//!
//! ### Reactive
//! ```text
//! readings ──► decide ──► fault override ──► query real plant ──► readings'
//! ```
//!
//! ### Predictive
//! ```text
//!           ┌─────────── model parameters ───────────┐
//!           ▼                                        │
//! previous command ──► predict (look-ahead)          │
//!                          │                         │
//!                          ▼                         │
//!                       decide ──► new command       │
//!                                      │             │
//!                     ┌────────────────┴──────┐      │
//!                     ▼                       ▼      │
//!               predict (compare)       query real   │
//!                     │                       │      │
//!                     └────► RMSE ◄───────────┘      │
//!                              │ > 0.45              │
//!                              ▼                     │
//!                        recalibrate ────────────────┘
//! ```
//!
//! The comparison prediction and the real query use the identical command;
//! otherwise their RMSE would measure the policy, not the model. Readings are
//! only ever updated from the real plant. After each predictive step the real
//! external coefficients drift upward by a random factor in `[1, 1 + span)`,
//! which the model then has to catch up with.
//!
//! The fault schedule is honoured by the reactive policy only. The predictive
//! decision step has no override; this mirrors the deployed behaviour and is
//! kept until confirmed otherwise.
//!
//! ## Threading
//!
//! Everything runs on the caller's thread. Plant queries block; recalibration
//! runs inline and the loop waits for it. The model parameters have exactly one
//! writer.

mod controller;
pub mod policy;
pub mod session;

pub use controller::{Controller, RunSummary, StepReport};
pub use policy::{decide_heaters, FaultSchedule, PolicyKind};
pub use session::ControlSession;
