//! Outbound ports - Interfaces that the application requires from external systems

mod clock_port;
mod document_store_port;
mod repository_port;

#[cfg(test)]
pub use clock_port::MockClockPort;
pub use clock_port::ClockPort;
#[cfg(test)]
pub use document_store_port::MockDocumentStorePort;
pub use document_store_port::{DocumentQuery, DocumentStorePort, StoreError};
pub use repository_port::{
    DocumentRepositoryPort, Page, RepositoryError, WorldRepositoryPort,
};
