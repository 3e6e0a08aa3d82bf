// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 集成测试
///
/// 所有测试都运行在内存 SQLite 上，目标站点由 wiremock 模拟
pub mod api_test;
pub mod helpers;
pub mod queue_test;
pub mod quote_workflow_test;
pub mod repository_test;
pub mod static_collector_test;
pub mod worker_test;
