// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_run::ScrapeStats;
use crate::domain::models::target::ScraperTarget;
use crate::utils::errors::{JobError, RepositoryError};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 浏览器启动或页面操作失败
    #[error("Browser error: {0}")]
    Browser(String),
    /// 页面脚本或选择器提取失败
    #[error("Extraction error: {0}")]
    Extraction(String),
    /// 表单自动化失败（字段或提交按钮缺失）
    #[error("Form automation error: {0}")]
    FormAutomation(String),
    /// robots.txt 禁止访问
    #[error("Disallowed by robots.txt: {0}")]
    Disallowed(String),
    /// 存储失败
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 网络超时、连接失败、5xx 与浏览器故障可重试；提取失败与 robots 禁止不可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            EngineError::Timeout | EngineError::Browser(_) => true,
            EngineError::Repository(RepositoryError::Database(_)) => true,
            _ => false,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for EngineError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        EngineError::Browser(e.to_string())
    }
}

impl From<EngineError> for JobError {
    fn from(e: EngineError) -> Self {
        if e.is_retryable() {
            JobError::Retryable(e.to_string())
        } else {
            JobError::Permanent(e.to_string())
        }
    }
}

/// 抓取失败，附带失败前已累积的统计
#[derive(Error, Debug)]
#[error("{error}")]
pub struct ScrapeFailure {
    pub stats: ScrapeStats,
    #[source]
    pub error: EngineError,
}

impl From<EngineError> for ScrapeFailure {
    fn from(error: EngineError) -> Self {
        Self {
            stats: ScrapeStats::default(),
            error,
        }
    }
}

/// 目标抓取引擎
///
/// 静态采集器与无头浏览器引擎的共同接口：抓取一个目标并返回统计
#[async_trait]
pub trait TargetScraper: Send + Sync {
    /// 执行抓取，写入抓取数据并返回统计
    async fn scrape_target(&self, target: &ScraperTarget) -> Result<ScrapeStats, ScrapeFailure>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
