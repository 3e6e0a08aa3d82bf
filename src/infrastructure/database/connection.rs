// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DatabaseSettings;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::{debug, warn};

/// 每个 sqlite 内存连接都是独立的数据库
fn is_sqlite_memory(url: &str) -> bool {
    url.starts_with("sqlite::memory:") || url.contains("mode=memory")
}

/// 创建数据库连接池
///
/// 支持 PostgreSQL 与 SQLite；内存 SQLite 固定为单连接，保证所有仓库看到同一份数据
pub async fn create_pool(settings: &DatabaseSettings) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(settings.url.as_str());

    if is_sqlite_memory(&settings.url) {
        if settings.max_connections.is_some_and(|max| max > 1) {
            warn!("In-memory sqlite ignores max_connections, using a single connection");
        }
        opt.max_connections(1).min_connections(1);
    } else {
        if let Some(max) = settings.max_connections {
            opt.max_connections(max);
        }
        if let Some(min) = settings.min_connections {
            opt.min_connections(min);
        }
        opt.max_lifetime(Duration::from_secs(3600));
    }

    if let Some(timeout) = settings.connect_timeout {
        opt.connect_timeout(Duration::from_secs(timeout))
            .acquire_timeout(Duration::from_secs(timeout));
    }
    if let Some(idle) = settings.idle_timeout {
        opt.idle_timeout(Duration::from_secs(idle));
    }
    opt.sqlx_logging(false);

    debug!(
        backend = if settings.url.starts_with("sqlite") { "sqlite" } else { "postgres" },
        "Connecting to database"
    );
    Database::connect(opt).await
}
