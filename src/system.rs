//! Operating system boundary: volume listing and registry queries, both injectable so scanners
//! can run against recorded data.
pub mod drives;
pub mod registry;
