// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 纯函数形式的业务规则：
/// - 字段规范化与内容哈希（normalization）
/// - 去重与补充（deduplication）
/// - 选择器解析与 HTML 提取（extraction_service）
/// - 报价价格计算（pricing）
pub mod deduplication;
pub mod extraction_service;
pub mod normalization;
pub mod pricing;
