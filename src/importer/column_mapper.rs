// ==========================================
// CRM 线索导入 - 列映射器实现
// ==========================================
// 职责: 源表头 → 目标字段的自动建议 + 冻结前检查
// 规则:
// - 表头与字段 ID/别名均做归一化（小写，去掉空格/下划线/连字符）
// - 先为所有表头做相等匹配，再为剩余表头取"表头包含的最长字段键"
// - 已被占用的字段不再建议（同一轮内按表头顺序先到先得）
// - 用户覆写永远优先，且不会被重新推导
// ==========================================

use crate::domain::import::{HeaderMapping, MappingEntry};
use crate::domain::types::MappingTarget;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::schema::SchemaRegistry;
use std::collections::HashSet;
use tracing::debug;

/// 归一化表头/字段名
pub fn normalize_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchQuality {
    Contains(usize), // 包含匹配（键长度）
    Exact,
}

pub struct ColumnMapper;

impl ColumnMapper {
    /// 为表头列表生成初始映射（定义域 = 表头列表）
    ///
    /// 不会失败: 最坏情况下所有表头均为 Unset
    pub fn suggest(&self, headers: &[String], schema: &SchemaRegistry) -> HeaderMapping {
        let mut claimed: HashSet<String> = HashSet::new();
        let mut matched: Vec<Option<String>> = vec![None; headers.len()];

        // 第一轮: 相等匹配，避免被前面表头的包含匹配抢走字段
        for (idx, header) in headers.iter().enumerate() {
            if let Some((MatchQuality::Exact, field_id)) = self.best_match(header, schema, &claimed)
            {
                claimed.insert(field_id.clone());
                matched[idx] = Some(field_id);
            }
        }

        // 第二轮: 剩余表头按表头顺序做包含匹配
        for (idx, header) in headers.iter().enumerate() {
            if matched[idx].is_some() {
                continue;
            }
            if let Some((_, field_id)) = self.best_match(header, schema, &claimed) {
                claimed.insert(field_id.clone());
                matched[idx] = Some(field_id);
            }
        }

        let entries = headers
            .iter()
            .zip(matched)
            .map(|(header, field_id)| {
                let suggested = field_id.map_or(MappingTarget::Unset, MappingTarget::Field);
                debug!(header = %header, suggested = %suggested, "列映射建议");

                MappingEntry {
                    header: header.clone(),
                    suggested,
                    overridden: None,
                }
            })
            .collect();

        HeaderMapping::new(entries)
    }

    /// 单个表头在未占用字段中的最佳匹配
    fn best_match(
        &self,
        header: &str,
        schema: &SchemaRegistry,
        claimed: &HashSet<String>,
    ) -> Option<(MatchQuality, String)> {
        let normalized = normalize_key(header);
        if normalized.is_empty() {
            return None;
        }

        let mut best: Option<(MatchQuality, &str)> = None;
        for spec in schema.fields() {
            if claimed.contains(&spec.field_id) {
                continue;
            }

            let keys = std::iter::once(spec.field_id.as_str())
                .chain(spec.aliases.iter().map(String::as_str));

            let quality = keys
                .filter_map(|key| {
                    let key = normalize_key(key);
                    if key.is_empty() {
                        None
                    } else if normalized == key {
                        Some(MatchQuality::Exact)
                    } else if normalized.contains(&key) {
                        Some(MatchQuality::Contains(key.len()))
                    } else {
                        None
                    }
                })
                .max();

            // 严格大于: 同等质量时保留注册表中靠前的字段
            if let Some(q) = quality {
                if best.map_or(true, |(b, _)| q > b) {
                    best = Some((q, spec.field_id.as_str()));
                }
            }
        }

        best.map(|(q, id)| (q, id.to_string()))
    }

    /// 设置用户选择（字段需存在于注册表中）
    pub fn assign(
        &self,
        mapping: &mut HeaderMapping,
        schema: &SchemaRegistry,
        header: &str,
        target: MappingTarget,
    ) -> ImportResult<()> {
        if let MappingTarget::Field(id) = &target {
            if !schema.contains(id) {
                return Err(ImportError::UnknownField(id.clone()));
            }
        }

        if mapping.set_override(header, target) {
            Ok(())
        } else {
            Err(ImportError::UnknownHeader(header.to_string()))
        }
    }

    /// 冻结映射: 拒绝一个字段被多个表头映射
    pub fn freeze(&self, mapping: HeaderMapping) -> ImportResult<FrozenMapping> {
        if let Some((field, headers)) = mapping.duplicate_fields().into_iter().next() {
            return Err(ImportError::DuplicateMapping { field, headers });
        }
        Ok(FrozenMapping(mapping))
    }
}

// ==========================================
// FrozenMapping - 校验前冻结的映射
// ==========================================
// 只能由 ColumnMapper::freeze 构造
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenMapping(HeaderMapping);

impl FrozenMapping {
    pub fn mapping(&self) -> &HeaderMapping {
        &self.0
    }

    pub fn into_inner(self) -> HeaderMapping {
        self.0
    }

    /// 映射到某字段的列位置
    pub fn column_of(&self, field_id: &str) -> Option<usize> {
        self.0
            .entries()
            .iter()
            .position(|e| e.effective().field_id() == Some(field_id))
    }
}
