// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供带优先级通道的作业队列和调度功能
/// 负责作业的排队、重试、死信和周期调度
pub mod job_queue;
pub mod scheduler;
