use std::collections::HashMap;

use dxf::Point;
use dxf::entities::{Entity, EntityType};
use tracing::warn;

use dxtab_core::record::{
    FIELD_BLOCK_NAME, FIELD_POSITION, FIELD_RADIUS, FIELD_TEXT_VALUE, Record,
};

use crate::errors::ExtractError;
use crate::xdata;

/// 提取策略：读取一类实体的语义字段并写入记录。
pub type StrategyFn = fn(&Entity, &mut Record) -> Result<(), ExtractError>;

/// 按类型标签分派的字段提取策略表。
///
/// 未注册的类型只得到默认记录（Handle/EntityType/Layer 加占位
/// Position）；注册表对外开放，新类型无需改动既有策略。
pub struct ExtractorRegistry {
    strategies: HashMap<&'static str, StrategyFn>,
}

impl ExtractorRegistry {
    /// 构造并注册内置策略。
    pub fn new() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        registry.register("POLYLINE", extract_polyline);
        registry.register("LWPOLYLINE", extract_lwpolyline);
        registry.register("LINE", extract_line);
        registry.register("INSERT", extract_insert);
        registry.register("TEXT", extract_text);
        registry.register("MTEXT", extract_mtext);
        registry.register("CIRCLE", extract_circle);
        registry.register("ARC", extract_arc);
        registry.register("SPLINE", extract_spline);
        registry
    }

    /// 注册或替换某个类型标签的策略。
    pub fn register(&mut self, tag: &'static str, strategy: StrategyFn) {
        self.strategies.insert(tag, strategy);
    }

    /// 已注册的类型标签。
    pub fn registered_tags(&self) -> impl Iterator<Item = &&'static str> {
        self.strategies.keys()
    }

    /// 对单个实体执行提取，返回归一化记录（含 XDATA 投影字段）。
    ///
    /// 已识别类型缺少预期数据时仅退回该实体的默认记录并继续，
    /// 不会中断整批提取。
    pub fn extract_record(&self, entity: &Entity) -> Record {
        let tag = entity_type_tag(&entity.specific);
        let handle = format!("{:X}", entity.common.handle.0);
        let mut record = Record::new(handle.clone(), tag, entity.common.layer.clone());

        if let Some(strategy) = self.strategies.get(tag) {
            if let Err(error) = strategy(entity, &mut record) {
                warn!(handle = %handle, tag, error = %error, "实体字段提取失败，退回默认记录");
                record = Record::new(handle, tag, entity.common.layer.clone());
            }
        }

        for (application, value) in xdata::first_string_values(&entity.common.x_data) {
            record.set(application, value);
        }
        record
    }
}

/// 实体类型标签，对应 DXF 的 dxftype 名称。
/// 所有尺寸标注子类共用 DIMENSION；仅未来新增的未知变体落入兜底标签。
pub fn entity_type_tag(specific: &EntityType) -> &'static str {
    match specific {
        EntityType::Face3D(_) => "3DFACE",
        EntityType::Solid3D(_) => "3DSOLID",
        EntityType::ProxyEntity(_) => "ACAD_PROXY_ENTITY",
        EntityType::Arc(_) => "ARC",
        EntityType::ArcAlignedText(_) => "ARCALIGNEDTEXT",
        EntityType::AttributeDefinition(_) => "ATTDEF",
        EntityType::Attribute(_) => "ATTRIB",
        EntityType::Body(_) => "BODY",
        EntityType::Circle(_) => "CIRCLE",
        EntityType::DgnUnderlay(_) => "DGNUNDERLAY",
        EntityType::RotatedDimension(_)
        | EntityType::RadialDimension(_)
        | EntityType::DiameterDimension(_)
        | EntityType::AngularThreePointDimension(_)
        | EntityType::OrdinateDimension(_) => "DIMENSION",
        EntityType::DwfUnderlay(_) => "DWFUNDERLAY",
        EntityType::Ellipse(_) => "ELLIPSE",
        EntityType::Helix(_) => "HELIX",
        EntityType::Image(_) => "IMAGE",
        EntityType::Insert(_) => "INSERT",
        EntityType::Leader(_) => "LEADER",
        EntityType::Light(_) => "LIGHT",
        EntityType::Line(_) => "LINE",
        EntityType::LwPolyline(_) => "LWPOLYLINE",
        EntityType::MLine(_) => "MLINE",
        EntityType::MText(_) => "MTEXT",
        EntityType::OleFrame(_) => "OLEFRAME",
        EntityType::Ole2Frame(_) => "OLE2FRAME",
        EntityType::PdfUnderlay(_) => "PDFUNDERLAY",
        EntityType::ModelPoint(_) => "POINT",
        EntityType::Polyline(_) => "POLYLINE",
        EntityType::Ray(_) => "RAY",
        EntityType::Region(_) => "REGION",
        EntityType::RText(_) => "RTEXT",
        EntityType::Section(_) => "SECTION",
        EntityType::Seqend(_) => "SEQEND",
        EntityType::Shape(_) => "SHAPE",
        EntityType::Solid(_) => "SOLID",
        EntityType::Spline(_) => "SPLINE",
        EntityType::Text(_) => "TEXT",
        EntityType::Tolerance(_) => "TOLERANCE",
        EntityType::Trace(_) => "TRACE",
        EntityType::Vertex(_) => "VERTEX",
        EntityType::Wipeout(_) => "WIPEOUT",
        EntityType::XLine(_) => "XLINE",
        _ => "OTHER",
    }
}

/// 坐标分量固定三位小数，保证重复导出可逐字节比对。
fn format_point(point: &Point) -> String {
    format!("({:.3},{:.3},{:.3})", point.x, point.y, point.z)
}

fn join_points<'a>(points: impl Iterator<Item = &'a Point>) -> String {
    let parts: Vec<String> = points.map(format_point).collect();
    parts.join("; ")
}

fn extract_polyline(entity: &Entity, record: &mut Record) -> Result<(), ExtractError> {
    let EntityType::Polyline(polyline) = &entity.specific else {
        return Err(ExtractError::ShapeMismatch { tag: "POLYLINE" });
    };
    record.set(
        FIELD_POSITION,
        join_points(polyline.vertices().map(|vertex| &vertex.location)),
    );
    Ok(())
}

fn extract_lwpolyline(entity: &Entity, record: &mut Record) -> Result<(), ExtractError> {
    let EntityType::LwPolyline(polyline) = &entity.specific else {
        return Err(ExtractError::ShapeMismatch { tag: "LWPOLYLINE" });
    };
    // 轻量多段线顶点只有 XY，Z 轴取整体标高（组码 38）
    let parts: Vec<String> = polyline
        .vertices
        .iter()
        .map(|vertex| format!("({:.3},{:.3},{:.3})", vertex.x, vertex.y, entity.common.elevation))
        .collect();
    record.set(FIELD_POSITION, parts.join("; "));
    Ok(())
}

fn extract_line(entity: &Entity, record: &mut Record) -> Result<(), ExtractError> {
    let EntityType::Line(line) = &entity.specific else {
        return Err(ExtractError::ShapeMismatch { tag: "LINE" });
    };
    record.set(
        FIELD_POSITION,
        format!(
            "Start{};End{}",
            format_point(&line.p1),
            format_point(&line.p2)
        ),
    );
    Ok(())
}

fn extract_insert(entity: &Entity, record: &mut Record) -> Result<(), ExtractError> {
    let EntityType::Insert(insert) = &entity.specific else {
        return Err(ExtractError::ShapeMismatch { tag: "INSERT" });
    };
    record.set(FIELD_POSITION, format_point(&insert.location));
    record.set(FIELD_BLOCK_NAME, insert.name.clone());
    Ok(())
}

fn extract_text(entity: &Entity, record: &mut Record) -> Result<(), ExtractError> {
    let EntityType::Text(text) = &entity.specific else {
        return Err(ExtractError::ShapeMismatch { tag: "TEXT" });
    };
    record.set(FIELD_POSITION, format_point(&text.location));
    record.set(FIELD_TEXT_VALUE, text.value.clone());
    Ok(())
}

fn extract_mtext(entity: &Entity, record: &mut Record) -> Result<(), ExtractError> {
    let EntityType::MText(mtext) = &entity.specific else {
        return Err(ExtractError::ShapeMismatch { tag: "MTEXT" });
    };
    record.set(FIELD_POSITION, format_point(&mtext.insertion_point));
    record.set(FIELD_TEXT_VALUE, plain_text(&mtext.text));
    Ok(())
}

fn extract_circle(entity: &Entity, record: &mut Record) -> Result<(), ExtractError> {
    let EntityType::Circle(circle) = &entity.specific else {
        return Err(ExtractError::ShapeMismatch { tag: "CIRCLE" });
    };
    record.set(FIELD_POSITION, format!("Center{}", format_point(&circle.center)));
    record.set(FIELD_RADIUS, circle.radius);
    Ok(())
}

fn extract_arc(entity: &Entity, record: &mut Record) -> Result<(), ExtractError> {
    let EntityType::Arc(arc) = &entity.specific else {
        return Err(ExtractError::ShapeMismatch { tag: "ARC" });
    };
    record.set(FIELD_POSITION, format!("Center{}", format_point(&arc.center)));
    record.set(FIELD_RADIUS, arc.radius);
    Ok(())
}

fn extract_spline(entity: &Entity, record: &mut Record) -> Result<(), ExtractError> {
    let EntityType::Spline(spline) = &entity.specific else {
        return Err(ExtractError::ShapeMismatch { tag: "SPLINE" });
    };
    record.set(FIELD_POSITION, join_points(spline.control_points.iter()));
    Ok(())
}

/// 去除 MTEXT 内联格式码，仅保留可读文本。
pub fn plain_text(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '{' | '}' => {}
            '\\' => match chars.next() {
                Some('P') | Some('X') => output.push('\n'),
                Some('~') => output.push(' '),
                Some('\\') => output.push('\\'),
                Some('{') => output.push('{'),
                Some('}') => output.push('}'),
                // 带参数的格式码一直延伸到分号
                Some('f' | 'F' | 'H' | 'h' | 'Q' | 'W' | 'C' | 'c' | 'T' | 'A' | 'p') => {
                    for next in chars.by_ref() {
                        if next == ';' {
                            break;
                        }
                    }
                }
                // 堆叠文本保留内容，分隔符统一替换为斜线
                Some('S') => {
                    for next in chars.by_ref() {
                        match next {
                            ';' => break,
                            '^' | '#' => output.push('/'),
                            _ => output.push(next),
                        }
                    }
                }
                // 下划线/上划线/删除线开关码没有文本贡献
                Some('L' | 'l' | 'O' | 'o' | 'K' | 'k') => {}
                Some(other) => output.push(other),
                None => {}
            },
            _ => output.push(ch),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxf::entities::{Arc, Circle, Ellipse, Insert, Line, LwPolyline, MText, Spline, Text};
    use dxf::{Handle, Point, XData, XDataItem};
    use dxtab_core::record::{
        FIELD_ENTITY_TYPE, FIELD_HANDLE, FIELD_LAYER, POSITION_NOT_APPLICABLE,
    };

    fn entity_on_layer(specific: EntityType, layer: &str, handle: u64) -> Entity {
        let mut entity = Entity::new(specific);
        entity.common.layer = layer.to_string();
        entity.common.handle = Handle(handle);
        entity
    }

    #[test]
    fn line_position_renders_start_and_end() {
        let mut line = Line::default();
        line.p1 = Point::new(0.0, 0.0, 0.0);
        line.p2 = Point::new(10.0, 0.0, 0.0);
        let entity = entity_on_layer(EntityType::Line(line), "PIPES", 0x2A);

        let record = ExtractorRegistry::new().extract_record(&entity);
        assert_eq!(record.cell(FIELD_HANDLE).as_deref(), Some("2A"));
        assert_eq!(record.cell(FIELD_ENTITY_TYPE).as_deref(), Some("LINE"));
        assert_eq!(record.cell(FIELD_LAYER).as_deref(), Some("PIPES"));
        assert_eq!(
            record.cell(FIELD_POSITION).as_deref(),
            Some("Start(0.000,0.000,0.000);End(10.000,0.000,0.000)")
        );
    }

    #[test]
    fn coordinates_render_with_exactly_three_decimals() {
        let mut text = Text::default();
        text.location = Point::new(1.0, 2.5, 0.0);
        text.value = "标注".to_string();
        let entity = entity_on_layer(EntityType::Text(text), "ANNOT", 1);

        let record = ExtractorRegistry::new().extract_record(&entity);
        assert_eq!(
            record.cell(FIELD_POSITION).as_deref(),
            Some("(1.000,2.500,0.000)")
        );
        assert_eq!(record.cell(FIELD_TEXT_VALUE).as_deref(), Some("标注"));
    }

    #[test]
    fn circle_and_arc_carry_center_and_radius() {
        let mut circle = Circle::default();
        circle.center = Point::new(5.0, 5.0, 0.0);
        circle.radius = 2.5;
        let entity = entity_on_layer(EntityType::Circle(circle), "GEOM", 2);

        let record = ExtractorRegistry::new().extract_record(&entity);
        assert_eq!(
            record.cell(FIELD_POSITION).as_deref(),
            Some("Center(5.000,5.000,0.000)")
        );
        assert_eq!(record.cell(FIELD_RADIUS).as_deref(), Some("2.5"));

        let mut arc = Arc::default();
        arc.center = Point::new(1.0, 2.0, 3.0);
        arc.radius = 7.0;
        let entity = entity_on_layer(EntityType::Arc(arc), "GEOM", 3);

        let record = ExtractorRegistry::new().extract_record(&entity);
        assert_eq!(record.cell(FIELD_ENTITY_TYPE).as_deref(), Some("ARC"));
        assert_eq!(record.cell(FIELD_RADIUS).as_deref(), Some("7"));
    }

    #[test]
    fn insert_records_block_name() {
        let mut insert = Insert::default();
        insert.name = "VALVE".to_string();
        insert.location = Point::new(3.0, 4.0, 0.0);
        let entity = entity_on_layer(EntityType::Insert(insert), "EQUIP", 4);

        let record = ExtractorRegistry::new().extract_record(&entity);
        assert_eq!(record.cell(FIELD_BLOCK_NAME).as_deref(), Some("VALVE"));
        assert_eq!(
            record.cell(FIELD_POSITION).as_deref(),
            Some("(3.000,4.000,0.000)")
        );
    }

    #[test]
    fn lwpolyline_vertices_use_polyline_elevation() {
        let mut polyline = LwPolyline::default();
        let mut first = dxf::LwPolylineVertex::default();
        first.x = 0.0;
        first.y = 10.0;
        let mut second = dxf::LwPolylineVertex::default();
        second.x = 10.0;
        second.y = 20.0;
        polyline.vertices = vec![first, second];
        let mut entity = entity_on_layer(EntityType::LwPolyline(polyline), "SKETCH", 5);
        entity.common.elevation = 1.5;

        let record = ExtractorRegistry::new().extract_record(&entity);
        assert_eq!(
            record.cell(FIELD_POSITION).as_deref(),
            Some("(0.000,10.000,1.500); (10.000,20.000,1.500)")
        );
    }

    #[test]
    fn type_tags_match_dxftype_names() {
        use dxf::entities::{Face3D, Leader, Solid, Vertex};

        assert_eq!(
            entity_type_tag(&EntityType::Solid(Solid::default())),
            "SOLID"
        );
        assert_eq!(
            entity_type_tag(&EntityType::Face3D(Face3D::default())),
            "3DFACE"
        );
        assert_eq!(
            entity_type_tag(&EntityType::Leader(Leader::default())),
            "LEADER"
        );
        assert_eq!(
            entity_type_tag(&EntityType::Vertex(Vertex::default())),
            "VERTEX"
        );
    }

    #[test]
    fn spline_joins_control_points() {
        let mut spline = Spline::default();
        spline.control_points = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
        ];
        let entity = entity_on_layer(EntityType::Spline(spline), "GEOM", 6);

        let record = ExtractorRegistry::new().extract_record(&entity);
        assert_eq!(
            record.cell(FIELD_POSITION).as_deref(),
            Some("(0.000,0.000,0.000); (1.000,1.000,0.000); (2.000,0.000,0.000)")
        );
    }

    #[test]
    fn mtext_value_is_markup_stripped() {
        let mut mtext = MText::default();
        mtext.insertion_point = Point::new(0.0, 0.0, 0.0);
        mtext.text = "{\\fSimHei|b0;管径}\\P第二行".to_string();
        let entity = entity_on_layer(EntityType::MText(mtext), "ANNOT", 7);

        let record = ExtractorRegistry::new().extract_record(&entity);
        assert_eq!(
            record.cell(FIELD_TEXT_VALUE).as_deref(),
            Some("管径\n第二行")
        );
    }

    #[test]
    fn type_without_strategy_gets_default_record_only() {
        let entity = entity_on_layer(EntityType::Ellipse(Ellipse::default()), "GEOM", 8);

        let record = ExtractorRegistry::new().extract_record(&entity);
        assert_eq!(record.cell(FIELD_ENTITY_TYPE).as_deref(), Some("ELLIPSE"));
        assert_eq!(
            record.cell(FIELD_POSITION).as_deref(),
            Some(POSITION_NOT_APPLICABLE)
        );
        assert!(record.cell(FIELD_RADIUS).is_none());
    }

    #[test]
    fn xdata_projection_merges_into_record() {
        let mut line = Line::default();
        line.p1 = Point::new(0.0, 0.0, 0.0);
        line.p2 = Point::new(1.0, 0.0, 0.0);
        let mut entity = entity_on_layer(EntityType::Line(line), "PIPES", 9);
        entity.common.x_data.push(XData {
            application_name: "GAS_NET".to_string(),
            items: vec![
                XDataItem::Integer(1),
                XDataItem::Str("PE100".to_string()),
                XDataItem::Str("ignored".to_string()),
            ],
        });

        let record = ExtractorRegistry::new().extract_record(&entity);
        assert_eq!(record.cell("GAS_NET").as_deref(), Some("PE100"));
    }

    #[test]
    fn custom_strategy_can_be_registered() {
        fn tag_points(_entity: &Entity, record: &mut Record) -> Result<(), ExtractError> {
            record.set(FIELD_POSITION, "tagged");
            Ok(())
        }

        let mut registry = ExtractorRegistry::new();
        registry.register("POINT", tag_points);
        let entity = entity_on_layer(
            EntityType::ModelPoint(dxf::entities::ModelPoint::default()),
            "0",
            10,
        );

        let record = registry.extract_record(&entity);
        assert_eq!(record.cell(FIELD_POSITION).as_deref(), Some("tagged"));
    }

    #[test]
    fn plain_text_handles_escapes_and_codes() {
        assert_eq!(plain_text("\\fArial;Hello\\PWorld"), "Hello\nWorld");
        assert_eq!(plain_text("{\\H2.5x;Big} small"), "Big small");
        assert_eq!(plain_text("a\\~b"), "a b");
        assert_eq!(plain_text("\\\\P"), "\\P");
        assert_eq!(plain_text("\\S1^2;"), "1/2");
        assert_eq!(plain_text("纯文本"), "纯文本");
    }
}
