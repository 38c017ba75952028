//! Admin directory adapters.

mod configured;

pub use configured::ConfiguredAdmins;
