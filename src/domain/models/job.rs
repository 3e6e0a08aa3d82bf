// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 作业实体
///
/// 编排器内部的工作单元，只存在于队列中。作业的副作用（运行记录、
/// 抓取数据、报价）才是业务数据。由于重试机制是至少一次投递，
/// 所有处理器都必须对存储写入保持幂等。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// 作业类型，决定由哪个处理器执行
    pub job_type: JobType,
    /// 所属优先级通道
    pub queue: Lane,
    pub status: JobStatus,
    /// 通道内优先级，数值越大越先执行
    pub priority: i32,
    /// 序列化后的负载
    pub payload: serde_json::Value,
    /// 已尝试次数（出队时递增）
    pub attempt_count: i32,
    /// 最大尝试次数，用尽后进入死信状态
    pub max_attempts: i32,
    pub last_error: Option<String>,
    pub lock_token: Option<Uuid>,
    /// 最早可执行时间
    pub run_at: DateTime<FixedOffset>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

/// 作业类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    /// `scrape:target`
    #[serde(rename = "scrape:target")]
    ScrapeTarget,
    /// `scrape:all`
    #[serde(rename = "scrape:all")]
    ScrapeAll,
    /// `scrape:enrich`
    #[serde(rename = "scrape:enrich")]
    ScrapeEnrich,
    /// `scrape:dedupe`
    #[serde(rename = "scrape:dedupe")]
    ScrapeDedupe,
    /// `cleanup:old_data`
    #[serde(rename = "cleanup:old_data")]
    CleanupOldData,
    /// `quote:scrape`
    #[serde(rename = "quote:scrape")]
    QuoteScrape,
}

impl JobType {
    pub const ALL: [JobType; 6] = [
        JobType::ScrapeTarget,
        JobType::ScrapeAll,
        JobType::ScrapeEnrich,
        JobType::ScrapeDedupe,
        JobType::CleanupOldData,
        JobType::QuoteScrape,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::ScrapeTarget => "scrape:target",
            JobType::ScrapeAll => "scrape:all",
            JobType::ScrapeEnrich => "scrape:enrich",
            JobType::ScrapeDedupe => "scrape:dedupe",
            JobType::CleanupOldData => "cleanup:old_data",
            JobType::QuoteScrape => "quote:scrape",
        }
    }

    /// 作业类型默认所属的优先级通道
    pub fn default_lane(&self) -> Lane {
        match self {
            JobType::QuoteScrape => Lane::Critical,
            JobType::ScrapeTarget | JobType::ScrapeAll => Lane::Default,
            JobType::ScrapeEnrich | JobType::ScrapeDedupe | JobType::CleanupOldData => Lane::Low,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

/// 优先级通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Critical,
    #[default]
    Default,
    Low,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Critical, Lane::Default, Lane::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Critical => "critical",
            Lane::Default => "default",
            Lane::Low => "low",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lane {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Lane::Critical),
            "default" => Ok(Lane::Default),
            "low" => Ok(Lane::Low),
            _ => Err(()),
        }
    }
}

/// 作业状态
///
/// Queued → Active → Completed，或在重试耗尽/永久失败后进入 Dead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    Active,
    Completed,
    /// 死信，不会再被调度
    Dead,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Active => write!(f, "active"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Dead => write!(f, "dead"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "active" => Ok(JobStatus::Active),
            "completed" => Ok(JobStatus::Completed),
            "dead" => Ok(JobStatus::Dead),
            _ => Err(()),
        }
    }
}

impl Job {
    /// 创建一个立即可执行的作业，通道取作业类型的默认通道
    pub fn new(job_type: JobType, payload: serde_json::Value) -> Self {
        let now: DateTime<FixedOffset> = Utc::now().fixed_offset();
        Self {
            id: Uuid::new_v4(),
            job_type,
            queue: job_type.default_lane(),
            status: JobStatus::Queued,
            priority: 0,
            payload,
            attempt_count: 0,
            max_attempts: 5,
            last_error: None,
            lock_token: None,
            run_at: now,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 从类型化负载创建作业
    pub fn from_payload<P: JobPayload>(payload: &P) -> Result<Self, serde_json::Error> {
        Ok(Self::new(P::JOB_TYPE, serde_json::to_value(payload)?))
    }

    pub fn with_max_attempts(mut self, max_attempts: i32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn run_at(mut self, time: DateTime<Utc>) -> Self {
        self.run_at = time.fixed_offset();
        self
    }

    /// 是否还有剩余尝试次数
    pub fn can_retry(&self) -> bool {
        self.attempt_count < self.max_attempts
    }

    /// 解析类型化负载
    pub fn decode<P: JobPayload>(&self) -> Result<P, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// 类型化作业负载
pub trait JobPayload: Serialize + DeserializeOwned {
    const JOB_TYPE: JobType;
}

/// `scrape:target` 负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeTargetPayload {
    pub target_id: Uuid,
}

impl JobPayload for ScrapeTargetPayload {
    const JOB_TYPE: JobType = JobType::ScrapeTarget;
}

/// `scrape:all` 负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScrapeAllPayload {
    #[serde(default)]
    pub force: bool,
}

impl JobPayload for ScrapeAllPayload {
    const JOB_TYPE: JobType = JobType::ScrapeAll;
}

/// `scrape:enrich` 负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichDataPayload {
    pub target_id: Uuid,
}

impl JobPayload for EnrichDataPayload {
    const JOB_TYPE: JobType = JobType::ScrapeEnrich;
}

/// `scrape:dedupe` 负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupeDataPayload {
    pub target_id: Uuid,
}

impl JobPayload for DedupeDataPayload {
    const JOB_TYPE: JobType = JobType::ScrapeDedupe;
}

/// `cleanup:old_data` 负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupOldDataPayload {
    pub days_old: i64,
}

impl JobPayload for CleanupOldDataPayload {
    const JOB_TYPE: JobType = JobType::CleanupOldData;
}

/// `quote:scrape` 负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeQuotePayload {
    pub quote_id: Uuid,
}

impl JobPayload for ScrapeQuotePayload {
    const JOB_TYPE: JobType = JobType::QuoteScrape;
}
