//! Application layer - Ports, request dispatch and DTOs
//!
//! This layer contains:
//! - Ports: the document store and repository contracts
//! - Context: per-call deadlines and cancellation
//! - Dispatch: the query/command façade over the World repository
//! - DTOs: request payloads accepted by the façade

pub mod context;
pub mod dispatch;
pub mod dto;
pub mod ports;
