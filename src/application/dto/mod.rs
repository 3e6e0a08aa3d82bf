// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据传输对象
///
/// HTTP 层的请求与响应结构
pub mod quote_request;
pub mod quote_response;
