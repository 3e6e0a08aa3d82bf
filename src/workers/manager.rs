// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::queue::scheduler::JobScheduler;
use crate::workers::job_worker::JobWorker;
use crate::workers::worker::HandlerRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 工作管理器
///
/// 维护固定大小的工作者池；所有工作者共享同一个调度器和处理器注册表
pub struct WorkerManager {
    scheduler: JobScheduler,
    registry: Arc<HandlerRegistry>,
    poll_interval: Duration,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new(scheduler: JobScheduler, registry: HandlerRegistry, poll_interval: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            scheduler,
            registry: Arc::new(registry),
            poll_interval,
            shutdown,
            handles: Vec::new(),
        }
    }

    /// 启动工作进程
    ///
    /// # 参数
    ///
    /// * `count` - 要启动的工作进程数量
    pub fn start_workers(&mut self, count: usize) {
        for job_type in self.registry.missing() {
            warn!(%job_type, "No handler registered, such jobs will be dead-lettered");
        }

        for _ in 0..count {
            let worker = JobWorker::new(
                self.scheduler.clone(),
                self.registry.clone(),
                self.poll_interval,
            );
            let shutdown = self.shutdown.subscribe();
            self.handles.push(tokio::spawn(async move {
                worker.run(shutdown).await;
            }));
        }
        info!("Started {} job workers", count);
    }

    /// 通知所有工作者退出，并等待正在执行的作业完成
    pub async fn shutdown(self) {
        info!("Shutting down workers...");
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("Worker task ended abnormally: {}", e);
            }
        }
        info!("Workers shut down successfully");
    }
}
