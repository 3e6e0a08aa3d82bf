// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(DbErr),

    /// 记录未找到
    #[error("Record not found")]
    NotFound,

    /// 状态冲突（条件更新未命中）
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 违反唯一约束
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    /// 存储的数据无法解析
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<DbErr> for RepositoryError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => RepositoryError::Duplicate(detail),
            _ => RepositoryError::Database(err),
        }
    }
}

/// 作业执行错误类型
///
/// 区分可重试错误与永久性错误，永久性错误不会再次入队
#[derive(Error, Debug)]
pub enum JobError {
    /// 可重试的错误（网络、超时、存储暂时不可用）
    #[error("Retryable: {0}")]
    Retryable(String),

    /// 永久性错误（负载无法解析、引用的数据不存在）
    #[error("Permanent: {0}")]
    Permanent(String),
}

impl JobError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::Retryable(_))
    }
}

impl From<RepositoryError> for JobError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => JobError::Permanent(err.to_string()),
            RepositoryError::Corrupt(_) | RepositoryError::Duplicate(_) => {
                JobError::Permanent(err.to_string())
            }
            _ => JobError::Retryable(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for JobError {
    fn from(err: serde_json::Error) -> Self {
        JobError::Permanent(format!("invalid payload: {}", err))
    }
}
