//! World queries and commands

use async_trait::async_trait;
use tracing::{info, instrument};

use super::{DispatchError, Dispatcher, Reply, Request, RequestHandler};
use crate::application::context::CallContext;
use crate::application::dto::{CreateWorldDto, WorldResponseDto};
use crate::application::ports::outbound::Page;

/// List worlds, one page at a time
#[derive(Debug, Clone, Default)]
pub struct ListWorldsQuery {
    pub page: Page,
}

impl Request for ListWorldsQuery {
    type Response = Vec<WorldResponseDto>;
}

#[derive(Debug, Clone)]
pub struct GetWorldByIdQuery {
    pub id: String,
}

impl GetWorldByIdQuery {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Request for GetWorldByIdQuery {
    type Response = WorldResponseDto;
}

#[derive(Debug, Clone)]
pub struct CreateWorldCommand {
    pub dto: CreateWorldDto,
}

impl CreateWorldCommand {
    pub fn new(dto: CreateWorldDto) -> Self {
        Self { dto }
    }
}

impl Request for CreateWorldCommand {
    type Response = WorldResponseDto;
}

#[async_trait]
impl RequestHandler<ListWorldsQuery> for Dispatcher {
    #[instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: ListWorldsQuery,
        ctx: &CallContext,
    ) -> Result<Reply<Vec<WorldResponseDto>>, DispatchError> {
        let worlds = self.worlds.find_all(request.page, ctx).await?;
        Ok(Reply::ok(
            worlds.into_iter().map(WorldResponseDto::from).collect(),
        ))
    }
}

#[async_trait]
impl RequestHandler<GetWorldByIdQuery> for Dispatcher {
    #[instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: GetWorldByIdQuery,
        ctx: &CallContext,
    ) -> Result<Reply<WorldResponseDto>, DispatchError> {
        let world = self.worlds.find_one(&request.id, ctx).await?;
        Ok(Reply::ok(WorldResponseDto::from(world)))
    }
}

#[async_trait]
impl RequestHandler<CreateWorldCommand> for Dispatcher {
    #[instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: CreateWorldCommand,
        ctx: &CallContext,
    ) -> Result<Reply<WorldResponseDto>, DispatchError> {
        request.dto.validate()?;

        let world = self.worlds.insert(request.dto.into_world(), ctx).await?;
        info!(world_id = %world.meta.id, name = %world.name, "Created world");
        Ok(Reply::created(WorldResponseDto::from(world)))
    }
}
