// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::EngineError;
use chromiumoxide::layout::Point;
use chromiumoxide::Page;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// 覆盖可用于识别自动化环境的运行时属性
pub const STEALTH_JS: &str = r#"
(() => {
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
    Object.defineProperty(navigator, 'languages', { get: () => ['tr-TR', 'tr', 'en-US', 'en'] });
    window.chrome = { runtime: {} };
    const originalQuery = window.navigator.permissions.query;
    window.navigator.permissions.query = (parameters) => (
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters)
    );
    return true;
})()
"#;

/// 在页面加载后注入反检测脚本
pub async fn apply_stealth(page: &Page) -> Result<(), EngineError> {
    page.evaluate(STEALTH_JS)
        .await
        .map_err(|e| EngineError::Browser(format!("stealth script failed: {}", e)))?;
    Ok(())
}

/// `[min_ms, max_ms]` 区间内的随机时长
pub fn random_delay(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
}

/// 模拟真人操作：鼠标移动与滚动，最后随机停顿 1~3 秒
pub async fn humanize(page: &Page) -> Result<(), EngineError> {
    page.move_mouse(Point { x: 100.0, y: 100.0 }).await?;
    sleep(Duration::from_millis(100)).await;
    page.move_mouse(Point { x: 200.0, y: 200.0 }).await?;
    sleep(Duration::from_millis(100)).await;

    page.evaluate("window.scrollBy(0, 300)").await?;
    sleep(Duration::from_millis(500)).await;
    page.evaluate("window.scrollBy(0, -300)").await?;

    sleep(random_delay(1000, 3000)).await;
    Ok(())
}
