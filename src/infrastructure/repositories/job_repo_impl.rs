// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobStatus, JobType, Lane};
use crate::domain::repositories::job_repository::{JobRepository, StuckReset};
use crate::domain::repositories::RepositoryError;
use crate::infrastructure::database::entities::job as job_entity;
use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, LockBehavior, LockType},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// 作业仓库实现
///
/// 基于SeaORM实现的作业数据访问层
#[derive(Clone)]
pub struct JobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobRepositoryImpl {
    /// 创建新的作业仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl TryFrom<job_entity::Model> for Job {
    type Error = RepositoryError;

    fn try_from(model: job_entity::Model) -> Result<Self, Self::Error> {
        let job_type: JobType = model.job_type.parse().map_err(|_| {
            RepositoryError::Corrupt(format!("unknown job type '{}'", model.job_type))
        })?;

        Ok(Self {
            id: model.id,
            job_type,
            queue: model.queue.parse().unwrap_or_default(),
            status: model.status.parse().unwrap_or_default(),
            priority: model.priority,
            payload: model.payload,
            attempt_count: model.attempt_count,
            max_attempts: model.max_attempts,
            last_error: model.last_error,
            lock_token: model.lock_token,
            run_at: model.run_at,
            started_at: model.started_at,
            completed_at: model.completed_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl From<Job> for job_entity::ActiveModel {
    fn from(job: Job) -> Self {
        Self {
            id: Set(job.id),
            job_type: Set(job.job_type.to_string()),
            queue: Set(job.queue.to_string()),
            status: Set(job.status.to_string()),
            priority: Set(job.priority),
            payload: Set(job.payload),
            attempt_count: Set(job.attempt_count),
            max_attempts: Set(job.max_attempts),
            last_error: Set(job.last_error),
            lock_token: Set(job.lock_token),
            run_at: Set(job.run_at),
            started_at: Set(job.started_at),
            completed_at: Set(job.completed_at),
            created_at: Set(job.created_at),
            updated_at: Set(job.updated_at),
        }
    }
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError> {
        let model: job_entity::ActiveModel = job.clone().into();
        model.insert(self.db.as_ref()).await?;
        Ok(job.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .map(Job::try_from)
            .transpose()
    }

    async fn update(&self, job: &Job) -> Result<Job, RepositoryError> {
        let mut job = job.clone();
        job.updated_at = now();
        let model: job_entity::ActiveModel = job.clone().into();
        model.update(self.db.as_ref()).await?;
        Ok(job)
    }

    async fn acquire_next(&self, worker_id: Uuid, lane: Lane) -> Result<Option<Job>, RepositoryError> {
        loop {
            let txn = self.db.begin().await?;
            let current = now();

            let candidate = job_entity::Entity::find()
                .filter(job_entity::Column::Status.eq(JobStatus::Queued.to_string()))
                .filter(job_entity::Column::Queue.eq(lane.to_string()))
                .filter(job_entity::Column::RunAt.lte(current))
                .order_by_desc(job_entity::Column::Priority)
                .order_by_asc(job_entity::Column::RunAt)
                .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
                .one(&txn)
                .await?;

            let Some(model) = candidate else {
                txn.commit().await?;
                return Ok(None);
            };

            let mut active: job_entity::ActiveModel = model.clone().into();

            // Unknown type tags go straight to the dead letter
            if model.job_type.parse::<JobType>().is_err() {
                warn!(job_id = %model.id, job_type = %model.job_type, "Dead-lettering job with unknown type");
                active.status = Set(JobStatus::Dead.to_string());
                active.last_error = Set(Some(format!("unknown job type '{}'", model.job_type)));
                active.completed_at = Set(Some(current));
                active.updated_at = Set(current);
                active.update(&txn).await?;
                txn.commit().await?;
                continue;
            }

            active.lock_token = Set(Some(worker_id));
            active.status = Set(JobStatus::Active.to_string());
            active.started_at = Set(Some(current));
            active.attempt_count = Set(model.attempt_count + 1);
            active.updated_at = Set(current);

            let updated = active.update(&txn).await?;
            txn.commit().await?;

            return Job::try_from(updated).map(Some);
        }
    }

    async fn mark_completed(&self, id: Uuid) -> Result<(), RepositoryError> {
        let current = now();
        let result = job_entity::Entity::update_many()
            .col_expr(
                job_entity::Column::Status,
                Expr::value(JobStatus::Completed.to_string()),
            )
            .col_expr(job_entity::Column::CompletedAt, Expr::value(Some(current)))
            .col_expr(job_entity::Column::LockToken, Expr::value(Option::<Uuid>::None))
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(current))
            .filter(job_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn reset_stuck_jobs(&self, timeout: Duration) -> Result<StuckReset, RepositoryError> {
        let current = now();
        let threshold = current - timeout;
        let stuck = || {
            Condition::all()
                .add(job_entity::Column::Status.eq(JobStatus::Active.to_string()))
                .add(
                    Condition::any()
                        .add(job_entity::Column::StartedAt.lte(threshold))
                        .add(job_entity::Column::StartedAt.is_null()),
                )
        };
        let reason = format!(
            "worker did not finish within {} minutes",
            timeout.num_minutes()
        );

        let txn = self.db.begin().await?;

        let dead = job_entity::Entity::update_many()
            .col_expr(job_entity::Column::Status, Expr::value(JobStatus::Dead.to_string()))
            .col_expr(job_entity::Column::LastError, Expr::value(Some(reason.clone())))
            .col_expr(job_entity::Column::LockToken, Expr::value(Option::<Uuid>::None))
            .col_expr(job_entity::Column::CompletedAt, Expr::value(Some(current)))
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(current))
            .filter(stuck())
            .filter(
                Expr::col(job_entity::Column::AttemptCount)
                    .gte(Expr::col(job_entity::Column::MaxAttempts)),
            )
            .exec(&txn)
            .await?
            .rows_affected;

        // Exhausted rows are no longer active, so this only sees jobs with attempts left
        let requeued = job_entity::Entity::update_many()
            .col_expr(job_entity::Column::Status, Expr::value(JobStatus::Queued.to_string()))
            .col_expr(job_entity::Column::LastError, Expr::value(Some(reason)))
            .col_expr(job_entity::Column::LockToken, Expr::value(Option::<Uuid>::None))
            .col_expr(
                job_entity::Column::StartedAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .col_expr(job_entity::Column::RunAt, Expr::value(current))
            .col_expr(job_entity::Column::UpdatedAt, Expr::value(current))
            .filter(stuck())
            .exec(&txn)
            .await?
            .rows_affected;

        txn.commit().await?;

        if dead > 0 {
            warn!(dead, "Dead-lettered stuck jobs with no attempts left");
        }
        Ok(StuckReset { requeued, dead })
    }

    async fn list_by_status(&self, status: JobStatus, limit: u64) -> Result<Vec<Job>, RepositoryError> {
        let models = job_entity::Entity::find()
            .filter(job_entity::Column::Status.eq(status.to_string()))
            .order_by_desc(job_entity::Column::UpdatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        Ok(models
            .into_iter()
            .filter_map(|model| match Job::try_from(model) {
                Ok(job) => Some(job),
                Err(e) => {
                    warn!("Skipping job row: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn count_queued(&self, job_type: JobType) -> Result<u64, RepositoryError> {
        let count = job_entity::Entity::find()
            .filter(job_entity::Column::JobType.eq(job_type.to_string()))
            .filter(job_entity::Column::Status.eq(JobStatus::Queued.to_string()))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn delete_completed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = job_entity::Entity::delete_many()
            .filter(job_entity::Column::Status.eq(JobStatus::Completed.to_string()))
            .filter(job_entity::Column::CompletedAt.lt(cutoff.fixed_offset()))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }
}
