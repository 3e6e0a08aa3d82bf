// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod browser;
pub mod field_registry;
pub mod headless_engine;
pub mod insurance_scraper;
pub mod quote_fetcher;
pub mod static_collector;
pub mod stealth;
pub mod traits;
