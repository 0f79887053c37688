//! Query/command dispatch façade
//!
//! External callers build a request value and hand it to `Dispatcher::send`.
//! Each request type has one `RequestHandler` implementation that calls the
//! repository and shapes the reply.

mod error;
mod world_requests;

pub use error::{DispatchError, DispatchErrorKind};
pub use world_requests::{CreateWorldCommand, GetWorldByIdQuery, ListWorldsQuery};

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::context::CallContext;
use crate::application::ports::outbound::WorldRepositoryPort;

/// A query or command routed through the dispatcher
pub trait Request: Send + Sync {
    type Response: Send;
}

#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(&self, request: R, ctx: &CallContext)
        -> Result<Reply<R::Response>, DispatchError>;
}

/// Outcome status of a successful request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    Created,
}

impl ReplyStatus {
    /// HTTP-equivalent status code
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::Created => 201,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    pub status: ReplyStatus,
    pub body: T,
}

impl<T> Reply<T> {
    pub fn ok(body: T) -> Self {
        Self {
            status: ReplyStatus::Ok,
            body,
        }
    }

    pub fn created(body: T) -> Self {
        Self {
            status: ReplyStatus::Created,
            body,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status.code()
    }
}

/// Routes requests to their handlers
#[derive(Clone)]
pub struct Dispatcher {
    worlds: Arc<dyn WorldRepositoryPort>,
}

impl Dispatcher {
    pub fn new(worlds: Arc<dyn WorldRepositoryPort>) -> Self {
        Self { worlds }
    }

    pub async fn send<R>(
        &self,
        request: R,
        ctx: &CallContext,
    ) -> Result<Reply<R::Response>, DispatchError>
    where
        R: Request,
        Self: RequestHandler<R>,
    {
        <Self as RequestHandler<R>>::handle(self, request, ctx).await
    }
}
