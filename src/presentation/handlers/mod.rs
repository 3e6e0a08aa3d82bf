// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// HTTP请求处理器模块
///
/// 只覆盖入队与查询；抓取本身总是在工作者里执行
pub mod quote_handler;
pub mod scrape_handler;
