//! Blood bank workflow backend: donor registry, eligibility screening, atomic collection into
//! blood units, inventory, staff, and hospital requests over a SQLite store.

pub mod api;
pub mod config;
pub mod domain;
pub mod eligibility;
pub mod error;
pub mod persistence;
pub mod services;
pub mod telemetry;
