// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 各作业类型的处理器
pub mod maintenance;
pub mod quote;
pub mod scrape;

pub use maintenance::{CleanupOldDataHandler, DedupeDataHandler, EnrichDataHandler};
pub use quote::QuoteScrapeHandler;
pub use scrape::{ScrapeAllHandler, ScrapeTargetHandler};
