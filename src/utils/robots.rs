// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use robotstxt::DefaultMatcher;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

const ROBOTS_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Robots.txt 检查接口
#[async_trait]
pub trait RobotsPolicy: Send + Sync {
    /// 检查URL是否被允许访问
    async fn is_allowed(&self, url: &Url, user_agent: &str) -> Result<bool>;
    /// 获取站点声明的爬取延迟
    async fn crawl_delay(&self, url: &Url, user_agent: &str) -> Result<Option<Duration>>;
}

#[derive(Clone)]
struct CachedRobots {
    content: String,
    expires_at: Instant,
}

/// Robots.txt 检查器
///
/// 按 `scheme://host:port` 缓存 robots.txt 一小时；获取失败或非 2xx 视为允许全部
#[derive(Clone)]
pub struct RobotsChecker {
    client: Client,
    cache: Arc<Mutex<HashMap<String, CachedRobots>>>,
    user_agent: String,
}

impl RobotsChecker {
    pub fn new(client: Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            cache: Arc::new(Mutex::new(HashMap::new())),
            user_agent: user_agent.into(),
        }
    }

    fn robots_url(url: &Url) -> Result<String> {
        let host = url
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("URL has no host: {}", url))?;
        let port = url.port_or_known_default().unwrap_or(80);
        Ok(format!("{}://{}:{}/robots.txt", url.scheme(), host, port))
    }

    async fn content_for(&self, url: &Url) -> Result<String> {
        let robots_url = Self::robots_url(url)?;

        {
            let mut cache = self.cache.lock();
            match cache.get(&robots_url) {
                Some(cached) if cached.expires_at > Instant::now() => {
                    return Ok(cached.content.clone())
                }
                Some(_) => {
                    cache.remove(&robots_url);
                }
                None => {}
            }
        }

        let content = match self
            .client
            .get(&robots_url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => resp.text().await.unwrap_or_default(),
            Ok(resp) => {
                debug!("robots.txt at {} returned {}", robots_url, resp.status());
                String::new()
            }
            Err(e) => {
                warn!("Failed to fetch robots.txt from {}: {}", robots_url, e);
                String::new()
            }
        };

        self.cache.lock().insert(
            robots_url,
            CachedRobots {
                content: content.clone(),
                expires_at: Instant::now() + ROBOTS_CACHE_TTL,
            },
        );

        Ok(content)
    }
}

#[async_trait]
impl RobotsPolicy for RobotsChecker {
    async fn is_allowed(&self, url: &Url, user_agent: &str) -> Result<bool> {
        let content = self.content_for(url).await?;
        let mut matcher = DefaultMatcher::default();
        Ok(matcher.one_agent_allowed_by_robots(&content, user_agent, url.as_str()))
    }

    async fn crawl_delay(&self, url: &Url, user_agent: &str) -> Result<Option<Duration>> {
        let content = self.content_for(url).await?;
        Ok(parse_crawl_delay(&content, user_agent))
    }
}

/// 解析适用于该 User-Agent 的 Crawl-delay 指令
///
/// 具体 agent 的分组优先于 `*`
fn parse_crawl_delay(content: &str, user_agent: &str) -> Option<Duration> {
    let agent_lower = user_agent.to_lowercase();
    let mut in_matching_group = false;
    let mut specific_found = false;
    let mut delay: Option<f64> = None;

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim().to_lowercase().as_str() {
            "user-agent" => {
                if value == "*" {
                    in_matching_group = !specific_found;
                } else if agent_lower.contains(&value.to_lowercase()) {
                    if !specific_found {
                        delay = None;
                    }
                    in_matching_group = true;
                    specific_found = true;
                } else {
                    in_matching_group = false;
                }
            }
            "crawl-delay" if in_matching_group => {
                if let Ok(d) = value.parse::<f64>() {
                    delay = Some(d);
                }
            }
            _ => {}
        }
    }

    delay.filter(|d| *d >= 0.0).map(Duration::from_secs_f64)
}
