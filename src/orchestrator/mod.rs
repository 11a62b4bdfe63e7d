//! Application-level orchestration.
//!
//! The `Station` session owns every clock component. The console and the
//! automatic loop both drive it, one at a time, so all state changes stay
//! strictly sequential.

mod automatic;
mod console;
mod station;

pub(crate) use console::run_console;
pub(crate) use station::Station;
