pub mod comparison;
pub mod diff_report;
pub mod error;
pub mod fingerprint;
pub mod ports;
pub mod snapshot;
pub mod value_objects;
