// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobStatus, JobType, Lane};
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// 卡住作业的处理结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StuckReset {
    /// 放回队列的作业数
    pub requeued: u64,
    /// 尝试次数用尽、转入死信的作业数
    pub dead: u64,
}

/// 作业仓库特质
///
/// 编排器的持久化后端，保存排队、延迟与死信作业
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 创建新作业
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// 根据ID查找作业
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Job>, RepositoryError>;
    /// 更新作业
    async fn update(&self, job: &Job) -> Result<Job, RepositoryError>;
    /// 从指定通道获取下一个可执行作业并加锁
    ///
    /// 通道内按优先级降序、`run_at` 升序选择；成功时作业变为 Active 且尝试次数加一
    async fn acquire_next(&self, worker_id: Uuid, lane: Lane) -> Result<Option<Job>, RepositoryError>;
    /// 标记作业已完成
    async fn mark_completed(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// 重置卡住的作业（Active 超过 `timeout`）
    ///
    /// `attempt_count` 已达到 `max_attempts` 的作业转入死信，其余放回队列
    async fn reset_stuck_jobs(&self, timeout: Duration) -> Result<StuckReset, RepositoryError>;
    /// 按状态列出作业
    async fn list_by_status(&self, status: JobStatus, limit: u64) -> Result<Vec<Job>, RepositoryError>;
    /// 统计某类型仍在排队（含延迟）的作业数
    async fn count_queued(&self, job_type: JobType) -> Result<u64, RepositoryError>;
    /// 删除在截止时间之前完成的作业
    async fn delete_completed_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError>;
}
