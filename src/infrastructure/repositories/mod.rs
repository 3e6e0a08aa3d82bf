// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// 提供领域仓库接口的具体实现
/// 包括各种实体仓库的数据库实现
pub mod customer_repo_impl;
pub mod job_repo_impl;
pub mod policy_repo_impl;
pub mod quote_repo_impl;
pub mod scrape_run_repo_impl;
pub mod scraped_row_repo_impl;
pub mod target_repo_impl;
