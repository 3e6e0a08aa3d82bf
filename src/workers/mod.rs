// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 固定大小的工作者池按通道权重取作业，并按作业类型分发到处理器
pub mod handlers;
pub mod job_worker;
pub mod manager;
pub mod worker;

pub use job_worker::JobWorker;
pub use manager::WorkerManager;
pub use worker::{HandlerRegistry, JobHandler};
