// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 作业（job）：编排器内部的工作单元与类型化负载
/// - 抓取目标（target）、运行记录（scrape_run）与抓取数据（scraped_row）
/// - 报价请求（quote）、公司报价（scraped_quote）与保单（policy）
/// - 客户（customer）及表单填写用的客户资料
pub mod customer;
pub mod job;
pub mod policy;
pub mod quote;
pub mod scrape_run;
pub mod scraped_quote;
pub mod scraped_row;
pub mod target;
