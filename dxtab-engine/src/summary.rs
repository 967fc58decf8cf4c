use dxf::Drawing;

use crate::extract::entity_type_tag;
use crate::xdata;

/// 预览默认的实体数上限。
pub const DEFAULT_MAX_ENTITIES: usize = 200;

/// 截断提示行。上限触顶时追加，且只追加一次。
pub const TRUNCATION_MARKER: &str = "...(已截断其余实体输出)";

/// 生成结构预览：一行加载摘要，随后每实体一行，必要时以截断提示收尾。
///
/// `max_entities` 为 `None` 表示不限制。上限在迭代前一次性解析为具体
/// 数量，触顶后剩余实体不再被访问，工作量与上限成正比而非文档大小。
pub fn summarize(drawing: &Drawing, max_entities: Option<usize>) -> Vec<String> {
    let total = drawing.entities().count();
    let bound = max_entities.unwrap_or(total);

    let mut lines = Vec::with_capacity(bound.min(total) + 2);
    lines.push(format!(
        "文件加载成功 (DXF 版本 {:?})，模型空间共有 {} 个实体。",
        drawing.header.version, total
    ));

    for (index, entity) in drawing.entities().take(bound).enumerate() {
        let mut line = format!(
            "[{}] 类型:{} 图层:{}",
            index + 1,
            entity_type_tag(&entity.specific),
            entity.common.layer
        );
        if let Some(details) = xdata::describe(&entity.common.x_data) {
            line.push_str(" | XDATA: ");
            line.push_str(&details);
        }
        lines.push(line);
    }

    if total > bound {
        lines.push(TRUNCATION_MARKER.to_string());
    }
    lines
}
