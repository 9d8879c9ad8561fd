//! Plant-health monitoring station.
//!
//! Two producer tasks (sensors, GPS) publish into single-slot mailboxes; a
//! periodic control core drains them, reacts to interrupt flags, runs the
//! TEST / NORMAL / ADVANCED mode machine and emits reports. Everything here is
//! HAL-agnostic; the STM32 firmware in `main.rs` wires it to real peripherals.
#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
#[macro_use]
pub(crate) mod fmt;

pub mod config;
pub mod control;
pub mod drivers;
pub mod flags;
pub mod mailbox;
pub mod report;
pub mod shutdown;
pub mod state;
pub mod stats;
pub mod tasks;
