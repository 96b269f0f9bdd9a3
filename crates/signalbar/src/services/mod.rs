//! Background services of the signalbar binary.

pub mod config_manager;
