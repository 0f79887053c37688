//! Ports - Boundaries between the application and the storage it drives

pub mod outbound;
