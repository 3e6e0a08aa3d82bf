// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 抓取运行记录
///
/// 一个目标的一次执行。只追加，不修改历史记录之外的行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperRun {
    pub id: Uuid,
    pub target_id: Uuid,
    pub status: RunStatus,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub finished_at: Option<DateTime<FixedOffset>>,
    pub stats: Option<ScrapeStats>,
    pub error_msg: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// 运行状态：Pending → Running → Completed | Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for RunStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RunStatus::Pending),
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 抓取统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapeStats {
    pub total_pages: u32,
    pub success_pages: u32,
    pub error_pages: u32,
    /// 新写入的记录数（重复内容不计）
    pub data_extracted: u32,
    pub duration_ms: u64,
}

impl ScraperRun {
    pub fn pending(target_id: Uuid) -> Self {
        let now = Utc::now().fixed_offset();
        Self {
            id: Uuid::new_v4(),
            target_id,
            status: RunStatus::Pending,
            started_at: None,
            finished_at: None,
            stats: None,
            error_msg: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn start(&mut self) {
        let now = Utc::now().fixed_offset();
        self.status = RunStatus::Running;
        self.started_at = Some(now);
        self.updated_at = now;
    }

    pub fn complete(&mut self, stats: ScrapeStats) {
        let now = Utc::now().fixed_offset();
        self.status = RunStatus::Completed;
        self.stats = Some(stats);
        self.finished_at = Some(now);
        self.updated_at = now;
    }

    pub fn fail(&mut self, stats: Option<ScrapeStats>, error: impl Into<String>) {
        let now = Utc::now().fixed_offset();
        self.status = RunStatus::Failed;
        self.stats = stats;
        self.error_msg = Some(error.into());
        self.finished_at = Some(now);
        self.updated_at = now;
    }
}
