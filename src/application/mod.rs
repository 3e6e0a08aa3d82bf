// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含报价流程与抓取入口的用例实现，以及 HTTP 层使用的 DTO
pub mod dto;
pub mod use_cases;
