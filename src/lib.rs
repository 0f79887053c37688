//! WrldBldr Worlds - Document repository layer for World records
//!
//! Worlds (and any other `DocumentEntity`) are stored as tagged JSON documents
//! in a shared bucket:
//! - `domain`: entities, document keys, sub-document values and paths
//! - `application`: store and repository ports, call context, dispatch façade
//! - `infrastructure`: store adapters, the generic repository, config, state

pub mod application;
pub mod domain;
pub mod infrastructure;
