//! Cast member use cases

use catalog_core::models::{CastMember, CastMemberType, SearchInput, SearchOutput};
use catalog_core::{cancellable, ensure_not_cancelled, AppError};
use catalog_db::{CastMemberRepository, UnitOfWork};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::persist;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCastMemberInput {
    pub name: String,
    pub member_type: CastMemberType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCastMemberInput {
    pub id: Uuid,
    pub name: String,
    pub member_type: CastMemberType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CastMemberOutput {
    pub id: Uuid,
    pub name: String,
    pub member_type: CastMemberType,
    pub created_at: DateTime<Utc>,
}

impl From<CastMember> for CastMemberOutput {
    fn from(cast_member: CastMember) -> Self {
        Self {
            id: cast_member.id,
            name: cast_member.name,
            member_type: cast_member.member_type,
            created_at: cast_member.created_at,
        }
    }
}

#[derive(Clone)]
pub struct CastMemberService {
    cast_members: Arc<dyn CastMemberRepository>,
    uow: Arc<dyn UnitOfWork>,
}

impl CastMemberService {
    pub fn new(cast_members: Arc<dyn CastMemberRepository>, uow: Arc<dyn UnitOfWork>) -> Self {
        Self { cast_members, uow }
    }

    #[tracing::instrument(skip(self, input, cancel), fields(cast_member.name = %input.name))]
    pub async fn create(
        &self,
        input: CreateCastMemberInput,
        cancel: &CancellationToken,
    ) -> Result<CastMemberOutput, AppError> {
        ensure_not_cancelled(cancel)?;
        let cast_member = CastMember::new(input.name, input.member_type)?;

        persist(self.uow.as_ref(), cancel, self.cast_members.insert(&cast_member)).await?;

        tracing::info!(cast_member_id = %cast_member.id, "Cast member created");
        Ok(cast_member.into())
    }

    #[tracing::instrument(skip(self, input, cancel), fields(cast_member.id = %input.id))]
    pub async fn update(
        &self,
        input: UpdateCastMemberInput,
        cancel: &CancellationToken,
    ) -> Result<CastMemberOutput, AppError> {
        let mut cast_member = cancellable(cancel, self.cast_members.get(input.id)).await?;
        cast_member.update(input.name, input.member_type)?;

        persist(self.uow.as_ref(), cancel, self.cast_members.update(&cast_member)).await?;
        Ok(cast_member.into())
    }

    pub async fn get(&self, id: Uuid, cancel: &CancellationToken) -> Result<CastMemberOutput, AppError> {
        let cast_member = cancellable(cancel, self.cast_members.get(id)).await?;
        Ok(cast_member.into())
    }

    #[tracing::instrument(skip(self, cancel))]
    pub async fn delete(&self, id: Uuid, cancel: &CancellationToken) -> Result<(), AppError> {
        let cast_member = cancellable(cancel, self.cast_members.get(id)).await?;
        persist(self.uow.as_ref(), cancel, self.cast_members.delete(&cast_member)).await?;
        tracing::info!(cast_member_id = %id, "Cast member deleted");
        Ok(())
    }

    pub async fn list(
        &self,
        input: &SearchInput,
        cancel: &CancellationToken,
    ) -> Result<SearchOutput<CastMemberOutput>, AppError> {
        let page = cancellable(cancel, self.cast_members.search(input)).await?;
        Ok(page.map(CastMemberOutput::from))
    }
}
