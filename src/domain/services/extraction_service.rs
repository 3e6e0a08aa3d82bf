// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::ScraperTarget;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// 字段到 CSS 选择器的映射
pub type SelectorMap = BTreeMap<String, String>;

/// 选择器配置
///
/// `name` 同时作为抓取记录的类型标签
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorProfile {
    pub name: String,
    pub selectors: SelectorMap,
}

impl SelectorProfile {
    fn builtin(name: &str, pairs: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            selectors: pairs
                .iter()
                .map(|(field, selector)| (field.to_string(), selector.to_string()))
                .collect(),
        }
    }
}

/// 按目标名称关键字匹配的内置配置
fn keyword_profiles() -> [SelectorProfile; 3] {
    [
        SelectorProfile::builtin(
            "product",
            &[
                ("name", "h1, .product-title, .product-name"),
                ("description", ".product-description, .description, p"),
                ("price", ".price, .premium, .cost"),
                ("features", ".features, .benefits, ul"),
            ],
        ),
        SelectorProfile::builtin(
            "contact",
            &[
                ("phone", ".phone, .tel, [href^='tel:']"),
                ("email", ".email, .mail, [href^='mailto:']"),
                ("address", ".address, .location, .contact-address"),
            ],
        ),
        SelectorProfile::builtin(
            "news",
            &[
                ("title", "h1, h2, .title, .news-title"),
                ("content", ".content, .news-content, .article-content"),
                ("date", ".date, .published, .news-date"),
            ],
        ),
    ]
}

/// 解析目标使用的选择器配置
///
/// 目标自带的选择器优先；否则按名称关键字匹配；最后使用通用配置
pub fn resolve_selectors(target: &ScraperTarget) -> SelectorProfile {
    if let Some(custom) = target.custom_selectors() {
        return SelectorProfile {
            name: "custom".to_string(),
            selectors: custom,
        };
    }

    let name = target.name.to_lowercase();
    keyword_profiles()
        .into_iter()
        .find(|profile| name.contains(&profile.name))
        .unwrap_or_else(|| {
            SelectorProfile::builtin(
                "default",
                &[
                    ("title", "h1, h2, .title"),
                    ("content", ".content, p"),
                    ("link", "a[href]"),
                ],
            )
        })
}

/// 单个页面的提取结果
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PageExtraction {
    /// 非空字段值
    pub fields: BTreeMap<String, String>,
    /// 无法解析的选择器对应的字段
    pub invalid_fields: Vec<String>,
}

/// 提取服务
///
/// 负责从 HTML 内容中按选择器提取字段
pub struct ExtractionService;

impl ExtractionService {
    /// 每个字段取第一个匹配元素的文本（空白折叠），空文本视为未匹配
    pub fn extract(html_content: &str, selectors: &SelectorMap) -> PageExtraction {
        let document = Html::parse_document(html_content);
        let mut result = PageExtraction::default();

        for (field, selector) in selectors {
            let Ok(parsed) = Selector::parse(selector) else {
                result.invalid_fields.push(field.clone());
                continue;
            };

            let text = document
                .select(&parsed)
                .map(|element| collapse_whitespace(&element.text().collect::<String>()))
                .find(|text| !text.is_empty());

            if let Some(text) = text {
                result.fields.insert(field.clone(), text);
            }
        }

        result
    }

    /// 同域链接（去掉片段），用于多页抓取
    pub fn same_domain_links(html_content: &str, page_url: &Url) -> Vec<Url> {
        let document = Html::parse_document(html_content);
        let Ok(anchor) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let mut links: Vec<Url> = document
            .select(&anchor)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| page_url.join(href).ok())
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .filter(|url| url.host_str() == page_url.host_str())
            .map(|mut url| {
                url.set_fragment(None);
                url
            })
            .collect();
        links.dedup();
        links
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "extraction_service_test.rs"]
mod tests;
