// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层基于 SeaORM 提供。
///
/// 包含的仓库接口：
/// - 作业仓库（job_repository）：编排器的排队、延迟与死信作业
/// - 目标仓库（target_repository）：抓取目标配置
/// - 运行记录仓库（scrape_run_repository）：抓取运行历史
/// - 抓取数据仓库（scraped_row_repository）：内容寻址的抓取记录
/// - 报价仓库（quote_repository）：报价请求与公司报价
/// - 保单仓库（policy_repository）与客户仓库（customer_repository）
pub mod customer_repository;
pub mod job_repository;
pub mod policy_repository;
pub mod quote_repository;
pub mod scrape_run_repository;
pub mod scraped_row_repository;
pub mod target_repository;

pub use crate::utils::errors::RepositoryError;
