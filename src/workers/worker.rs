// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobType};
use crate::utils::errors::JobError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// 作业处理器特质
///
/// 每种作业类型注册一个处理器。投递语义是至少一次，处理器对存储的写入必须幂等
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// 处理器负责的作业类型
    fn job_type(&self) -> JobType;

    /// 执行作业
    async fn handle(&self, job: &Job) -> Result<(), JobError>;
}

/// 按作业类型分发的处理器注册表
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<JobType, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册处理器，同类型的旧处理器会被替换
    pub fn register(mut self, handler: Arc<dyn JobHandler>) -> Self {
        self.handlers.insert(handler.job_type(), handler);
        self
    }

    pub fn get(&self, job_type: JobType) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(&job_type).cloned()
    }

    /// 尚未注册处理器的作业类型
    pub fn missing(&self) -> Vec<JobType> {
        JobType::ALL
            .into_iter()
            .filter(|t| !self.handlers.contains_key(t))
            .collect()
    }
}
