//! Common fixtures for HeatTwin integration tests
//!
//! - [`thermal`]: in-process three-zone plant with the simulator's step equation
//! - helpers to build failing-sensor reports and diagnosis sets

#![allow(dead_code)]

pub mod thermal;

use heattwin_core::Diagnosis;

/// Diagnosis from component names
pub fn diagnosis(names: &[&str]) -> Diagnosis {
    names.iter().map(|s| s.to_string()).collect()
}

/// Failing-sensor report from sensor names
pub fn report(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}
