use dxf::{XData, XDataItem};

/// DXF 扩展数据中字符串负载的组码。
pub const STRING_CODE: i32 = 1000;

/// 控制组（花括号）的组码。
const CONTROL_CODE: i32 = 1002;

/// 将一个应用标签下的 XDATA 项深度优先展平为 (组码, 显示值) 序列。
/// 控制组展开为成对的花括号项，内部顺序保持文件原始顺序。
pub fn flatten_items(items: &[XDataItem], pairs: &mut Vec<(i32, String)>) {
    for item in items {
        match item {
            XDataItem::Str(value) => pairs.push((STRING_CODE, value.clone())),
            XDataItem::ControlGroup(inner) => {
                pairs.push((CONTROL_CODE, "{".to_string()));
                flatten_items(inner, pairs);
                pairs.push((CONTROL_CODE, "}".to_string()));
            }
            XDataItem::LayerName(name) => pairs.push((1003, name.clone())),
            XDataItem::BinaryData(bytes) => pairs.push((1004, hex_string(bytes))),
            XDataItem::Handle(handle) => pairs.push((1005, format!("{:X}", handle.0))),
            XDataItem::ThreeReals(x, y, z) => pairs.push((1010, format!("({x},{y},{z})"))),
            XDataItem::WorldSpacePosition(point) => {
                pairs.push((1011, format!("({},{},{})", point.x, point.y, point.z)));
            }
            XDataItem::WorldSpaceDisplacement(point) => {
                pairs.push((1012, format!("({},{},{})", point.x, point.y, point.z)));
            }
            XDataItem::WorldDirection(vector) => {
                pairs.push((1013, format!("({},{},{})", vector.x, vector.y, vector.z)));
            }
            XDataItem::Real(value) => pairs.push((1040, format!("{value}"))),
            XDataItem::Distance(value) => pairs.push((1041, format!("{value}"))),
            XDataItem::ScaleFactor(value) => pairs.push((1042, format!("{value}"))),
            XDataItem::Integer(value) => pairs.push((1070, format!("{value}"))),
            XDataItem::Long(value) => pairs.push((1071, format!("{value}"))),
        }
    }
}

/// 导出投影：每个应用标签取第一个组码 1000 的字符串值，之后的
/// 1000 项与其他组码一律不进表。表格模型是扁平的，1000 定义为
/// 主要的人读字符串负载，其余类型只在预览中展示。
pub fn first_string_values(x_data: &[XData]) -> Vec<(String, String)> {
    x_data
        .iter()
        .filter_map(|application| {
            let mut pairs = Vec::new();
            flatten_items(&application.items, &mut pairs);
            pairs
                .into_iter()
                .find(|(code, _)| *code == STRING_CODE)
                .map(|(_, value)| (application.application_name.clone(), value))
        })
        .collect()
}

/// 预览渲染：逐应用标签列出全部 (组码:值) 对，
/// 形如 `TAG(1000:value, 1070:7); TAG2(...)`。
pub fn describe(x_data: &[XData]) -> Option<String> {
    if x_data.is_empty() {
        return None;
    }
    let parts: Vec<String> = x_data
        .iter()
        .map(|application| {
            let mut pairs = Vec::new();
            flatten_items(&application.items, &mut pairs);
            let rendered: Vec<String> = pairs
                .iter()
                .map(|(code, value)| format!("{code}:{value}"))
                .collect();
            format!("{}({})", application.application_name, rendered.join(", "))
        })
        .collect();
    Some(parts.join("; "))
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02X}")).collect()
}
