use dxtab_core::record::{FIELD_BLOCK_NAME, FIELD_TEXT_VALUE, Record};
use dxtab_core::schema;
use dxtab_io::{CsvTableWriter, TableSink, UTF8_BOM};

#[test]
fn output_starts_with_bom_and_header() {
    let dir = tempfile::tempdir().expect("创建临时目录");
    let path = dir.path().join("out.csv");

    let records = vec![Record::new("1A", "LINE", "0")];
    let columns = schema::reconcile(&records);
    CsvTableWriter::new()
        .write(&path, &columns, &records)
        .expect("写出 CSV 失败");

    let bytes = std::fs::read(&path).expect("读取输出文件");
    assert!(bytes.starts_with(UTF8_BOM));

    let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).expect("UTF-8 解码");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Handle,EntityType,Layer,Position"));
    assert_eq!(lines.next(), Some("1A,LINE,0,N/A"));
}

#[test]
fn non_ascii_and_embedded_delimiters_roundtrip() {
    let dir = tempfile::tempdir().expect("创建临时目录");
    let path = dir.path().join("out.csv");

    let mut record = Record::new("1A", "TEXT", "燃气图层");
    record.set(FIELD_TEXT_VALUE, "DN200,主管;\"备注\"");
    let records = vec![record];
    let columns = schema::reconcile(&records);
    CsvTableWriter::new()
        .write(&path, &columns, &records)
        .expect("写出 CSV 失败");

    let bytes = std::fs::read(&path).expect("读取输出文件");
    let mut reader = csv::Reader::from_reader(&bytes[UTF8_BOM.len()..]);
    let headers = reader.headers().expect("读取表头").clone();
    let text_index = headers
        .iter()
        .position(|name| name == FIELD_TEXT_VALUE)
        .expect("缺少 TextValue 列");

    let row = reader
        .records()
        .next()
        .expect("缺少数据行")
        .expect("解析数据行");
    assert_eq!(&row[text_index], "DN200,主管;\"备注\"");
    assert_eq!(&row[2], "燃气图层");
}

#[test]
fn missing_parent_directories_are_created() {
    let dir = tempfile::tempdir().expect("创建临时目录");
    let path = dir.path().join("nested").join("deeper").join("out.csv");

    let records = vec![Record::new("1A", "LINE", "0")];
    let columns = schema::reconcile(&records);
    CsvTableWriter::new()
        .write(&path, &columns, &records)
        .expect("写出 CSV 失败");

    assert!(path.is_file());
}

#[test]
fn records_missing_schema_fields_write_empty_cells() {
    let dir = tempfile::tempdir().expect("创建临时目录");
    let path = dir.path().join("out.csv");

    let mut with_block = Record::new("1A", "INSERT", "0");
    with_block.set(FIELD_BLOCK_NAME, "VALVE");
    let without_block = Record::new("1B", "LINE", "0");
    let records = vec![with_block, without_block];
    let columns = schema::reconcile(&records);
    CsvTableWriter::new()
        .write(&path, &columns, &records)
        .expect("写出 CSV 失败");

    let bytes = std::fs::read(&path).expect("读取输出文件");
    let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).expect("UTF-8 解码");
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("Handle,EntityType,Layer,BlockName,Position")
    );
    assert_eq!(lines.next(), Some("1A,INSERT,0,VALVE,N/A"));
    assert_eq!(lines.next(), Some("1B,LINE,0,,N/A"));
}
