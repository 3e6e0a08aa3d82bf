// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 表单字段名 → CSS 选择器
pub type FieldSelectors = BTreeMap<String, String>;

/// 表单字段的填写顺序
pub const FORM_FIELDS: [&str; 9] = [
    "first_name",
    "last_name",
    "email",
    "phone",
    "tckn",
    "vehicle_brand",
    "vehicle_model",
    "vehicle_year",
    "vehicle_plate",
];

const DEFAULT_SELECTORS: [(&str, &str); 9] = [
    ("first_name", "input[name='firstName'], input[name='first_name'], #firstName"),
    ("last_name", "input[name='lastName'], input[name='last_name'], #lastName"),
    ("email", "input[name='email'], input[type='email'], #email"),
    ("phone", "input[name='phone'], input[name='telephone'], #phone"),
    ("tckn", "input[name='tckn'], input[name='tcno'], #tckn"),
    ("vehicle_brand", "select[name='brand'], select[name='vehicleBrand'], #brand"),
    ("vehicle_model", "select[name='model'], select[name='vehicleModel'], #model"),
    ("vehicle_year", "select[name='year'], select[name='vehicleYear'], #year"),
    ("vehicle_plate", "input[name='plate'], input[name='licensePlate'], #plate"),
];

/// 按公司名称登记的表单字段选择器
///
/// 公司条目只需声明与默认表不同的字段，查找时与默认表合并。
/// 未登记的公司直接使用默认表。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRegistry {
    default: FieldSelectors,
    #[serde(default)]
    companies: HashMap<String, FieldSelectors>,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FieldRegistry {
    /// 内置的土耳其保险公司表单配置
    pub fn builtin() -> Self {
        let default = DEFAULT_SELECTORS
            .iter()
            .map(|(field, selector)| (field.to_string(), selector.to_string()))
            .collect();

        Self {
            default,
            companies: HashMap::new(),
        }
        .with_company("Anadolu Sigorta", FieldSelectors::new())
        .with_company(
            "Allianz",
            FieldSelectors::from([(
                "phone".to_string(),
                "input[name='phone'], input[name='mobile'], #phone".to_string(),
            )]),
        )
        .with_company("Mapfre", FieldSelectors::new())
    }

    /// 登记（或替换）一家公司的字段覆盖
    pub fn with_company(mut self, company: &str, overrides: FieldSelectors) -> Self {
        self.companies.insert(company.to_lowercase(), overrides);
        self
    }

    pub fn is_known(&self, company: &str) -> bool {
        self.companies.contains_key(&company.to_lowercase())
    }

    /// 查找公司对应的完整字段表，公司名不区分大小写
    pub fn selectors_for(&self, company: &str) -> FieldSelectors {
        let mut selectors = self.default.clone();
        if let Some(overrides) = self.companies.get(&company.to_lowercase()) {
            selectors.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        selectors
    }
}
