pub mod record {
    use std::collections::HashMap;
    use std::fmt;

    use serde::{Deserialize, Serialize};

    /// 基础列：任何实体记录都会带上的字段。
    pub const FIELD_HANDLE: &str = "Handle";
    pub const FIELD_ENTITY_TYPE: &str = "EntityType";
    pub const FIELD_LAYER: &str = "Layer";
    pub const FIELD_BLOCK_NAME: &str = "BlockName";
    pub const FIELD_TEXT_VALUE: &str = "TextValue";
    pub const FIELD_RADIUS: &str = "Radius";
    pub const FIELD_POSITION: &str = "Position";

    /// 无提取规则的实体类型在 Position 列中使用的占位值。
    pub const POSITION_NOT_APPLICABLE: &str = "N/A";

    /// 表格单元格值。导出表是扁平的，只承载字符串与数值两类标量。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum FieldValue {
        Text(String),
        Number(f64),
    }

    impl FieldValue {
        /// 渲染为单元格文本。数值使用最短往返表示，不做小数位截断。
        pub fn to_cell(&self) -> String {
            match self {
                FieldValue::Text(text) => text.clone(),
                FieldValue::Number(value) => format!("{value}"),
            }
        }
    }

    impl fmt::Display for FieldValue {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                FieldValue::Text(text) => f.write_str(text),
                FieldValue::Number(value) => write!(f, "{value}"),
            }
        }
    }

    impl From<&str> for FieldValue {
        fn from(value: &str) -> Self {
            FieldValue::Text(value.to_string())
        }
    }

    impl From<String> for FieldValue {
        fn from(value: String) -> Self {
            FieldValue::Text(value)
        }
    }

    impl From<f64> for FieldValue {
        fn from(value: f64) -> Self {
            FieldValue::Number(value)
        }
    }

    /// 单个实体的归一化记录：字段名到标量值的映射。
    ///
    /// 记录在一次导出过程中为每个实体新建，写出对应行后即丢弃，
    /// 不做跨批次持久化。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Record {
        fields: HashMap<String, FieldValue>,
    }

    impl Record {
        /// 构造带默认字段的记录：Handle、EntityType、Layer 与占位 Position。
        pub fn new(
            handle: impl Into<String>,
            entity_type: impl Into<String>,
            layer: impl Into<String>,
        ) -> Self {
            let mut fields = HashMap::new();
            fields.insert(FIELD_HANDLE.to_string(), FieldValue::Text(handle.into()));
            fields.insert(
                FIELD_ENTITY_TYPE.to_string(),
                FieldValue::Text(entity_type.into()),
            );
            fields.insert(FIELD_LAYER.to_string(), FieldValue::Text(layer.into()));
            fields.insert(
                FIELD_POSITION.to_string(),
                FieldValue::Text(POSITION_NOT_APPLICABLE.to_string()),
            );
            Self { fields }
        }

        /// 写入或覆盖一个字段。
        pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
            self.fields.insert(name.into(), value.into());
        }

        #[inline]
        pub fn get(&self, name: &str) -> Option<&FieldValue> {
            self.fields.get(name)
        }

        #[inline]
        pub fn contains(&self, name: &str) -> bool {
            self.fields.contains_key(name)
        }

        /// 字段名迭代（无序）。
        #[inline]
        pub fn field_names(&self) -> impl Iterator<Item = &str> {
            self.fields.keys().map(String::as_str)
        }

        /// 按列名渲染单元格，缺失字段返回 `None`。
        pub fn cell(&self, name: &str) -> Option<String> {
            self.fields.get(name).map(FieldValue::to_cell)
        }

        #[inline]
        pub fn len(&self) -> usize {
            self.fields.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.fields.is_empty()
        }
    }

}

pub mod schema {
    use crate::record::{
        FIELD_BLOCK_NAME, FIELD_ENTITY_TYPE, FIELD_HANDLE, FIELD_LAYER, FIELD_POSITION,
        FIELD_RADIUS, FIELD_TEXT_VALUE, Record,
    };
    use std::collections::BTreeSet;

    /// 首选列前缀。出现在任一记录中的首选字段按此顺序排在最前，
    /// 保证重复导出时核心 CAD 属性的列位置稳定。
    pub const PREFERRED_FIELDS: [&str; 7] = [
        FIELD_HANDLE,
        FIELD_ENTITY_TYPE,
        FIELD_LAYER,
        FIELD_BLOCK_NAME,
        FIELD_TEXT_VALUE,
        FIELD_RADIUS,
        FIELD_POSITION,
    ];

    /// 归并一批记录的字段集合为确定的列序。
    ///
    /// 两级排序：首选前缀（与观测到的字段取交集、保持既定顺序），
    /// 其余字段（主要是 XDATA 应用标签）按字典序追加。
    /// 结果只取决于字段名集合，与记录顺序无关。
    pub fn reconcile(records: &[Record]) -> Vec<String> {
        let mut observed: BTreeSet<&str> = BTreeSet::new();
        for record in records {
            observed.extend(record.field_names());
        }

        let mut columns: Vec<String> = PREFERRED_FIELDS
            .iter()
            .filter(|name| observed.contains(**name))
            .map(|name| name.to_string())
            .collect();
        columns.extend(
            observed
                .iter()
                .filter(|name| !PREFERRED_FIELDS.contains(*name))
                .map(|name| name.to_string()),
        );
        columns
    }

}
