use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::NaiveDate;
use std::path::Path;

use crate::error::SourceError;
use crate::models::record::parse_date_text;
use crate::models::source::{RecordSource, SourceRow};

/// 学员 ID 所在列（B 列）
const ID_COLUMN: usize = 1;
/// 开始日期所在列（C 列）
const START_COLUMN: usize = 2;
/// 结束日期所在列（D 列）
const END_COLUMN: usize = 3;

/// 从表格文件（xlsx / xls / ods）读取的学员表
///
/// 第一行是表头，数据从第二行开始。
#[derive(Debug, Clone)]
pub struct XlsxRecordSource {
    path: String,
    rows: Vec<Vec<Data>>,
}

impl XlsxRecordSource {
    /// 打开工作簿并读入指定工作表
    ///
    /// 文件打不开视为不可用，找不到工作表视为格式错误。
    pub fn open(path: impl AsRef<Path>, sheet: &str) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let mut workbook =
            open_workbook_auto(path).map_err(|e| SourceError::unavailable(&display, e))?;
        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| SourceError::parse(&display, format!("工作表 '{}': {}", sheet, e)))?;

        // range 从第一个非空单元格开始，补回前面的空行空列，列号才和表格一致
        let (first_row, first_col) = range.start().unwrap_or((0, 0));
        let rows: Vec<Vec<Data>> = range
            .rows()
            .enumerate()
            .filter(|(offset, _)| first_row as usize + offset >= 1)
            .map(|(_, cells)| {
                let mut row = vec![Data::Empty; first_col as usize];
                row.extend_from_slice(cells);
                row
            })
            .collect();

        tracing::info!("✓ 学员表已加载: {} [{}] ({} 行数据)", path.display(), sheet, rows.len());

        Ok(Self::from_rows(&display, rows))
    }

    /// 直接用已读出的数据行（不含表头）构造
    pub fn from_rows(path: &str, rows: Vec<Vec<Data>>) -> Self {
        Self {
            path: path.to_string(),
            rows,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl RecordSource for XlsxRecordSource {
    fn rows(&self) -> Box<dyn Iterator<Item = SourceRow> + Send + '_> {
        Box::new(self.rows.iter().map(|cells| row_from_cells(cells)))
    }
}

fn row_from_cells(cells: &[Data]) -> SourceRow {
    let identifier = cell_text(cells.get(ID_COLUMN));
    SourceRow::build(
        &identifier,
        cell_date(cells.get(START_COLUMN)),
        cell_date(cells.get(END_COLUMN)),
    )
}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Int(i)) => i.to_string(),
        // 数字 ID 在表格里常被存成浮点数
        Some(Data::Float(f)) if f.fract() == 0.0 => format!("{}", *f as i64),
        Some(other) => other.to_string(),
    }
}

fn cell_date(cell: Option<&Data>) -> Result<NaiveDate, String> {
    match cell {
        None | Some(Data::Empty) => Err("未填写".to_string()),
        Some(Data::String(s)) if s.trim().is_empty() => Err("未填写".to_string()),
        Some(Data::String(s)) | Some(Data::DateTimeIso(s)) => {
            parse_date_text(s).ok_or_else(|| format!("无法解析 '{}'", s))
        }
        Some(other) => other
            .as_date()
            .ok_or_else(|| format!("不是日期: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::Record;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    #[test]
    fn test_rows_convert_cells() {
        let source = XlsxRecordSource::from_rows(
            "atestados.xlsx",
            vec![
                vec![text("Ana"), text("1002003"), text("01/02/2025"), text("10/02/2025")],
                vec![
                    text("Rui"),
                    Data::Float(1002004.0),
                    Data::DateTimeIso("2025-03-01T00:00:00".to_string()),
                    text("2025-03-05"),
                ],
                vec![text("Bia"), Data::Int(1002005), Data::Empty, text("05/03/2025")],
                vec![Data::Empty, Data::Empty, Data::Empty, Data::Empty],
                vec![text("Leo"), text("1002006"), text("01/02/2025"), text("10/02/2025")],
            ],
        );
        let rows: Vec<SourceRow> = source.rows().collect();

        assert_eq!(
            rows[0],
            SourceRow::Record(Record::new("1002003", ymd(2025, 2, 1), ymd(2025, 2, 10)))
        );
        assert_eq!(
            rows[1],
            SourceRow::Record(Record::new("1002004", ymd(2025, 3, 1), ymd(2025, 3, 5)))
        );
        assert!(matches!(rows[2], SourceRow::Invalid { ref identifier, .. } if identifier == "1002005"));
        assert_eq!(rows[3], SourceRow::EndOfData);
        assert_eq!(source.count_until_end(), 3);
    }

    #[test]
    fn test_unparsable_date_is_invalid() {
        let source = XlsxRecordSource::from_rows(
            "x.xlsx",
            vec![vec![text("Ana"), text("S1"), text("amanhã"), text("10/02/2025")]],
        );
        let rows: Vec<SourceRow> = source.rows().collect();
        assert!(matches!(rows[0], SourceRow::Invalid { ref reason, .. } if reason.contains("无法解析")));
    }

    #[test]
    fn test_missing_workbook_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = XlsxRecordSource::open(dir.path().join("atestados.xlsx"), "Plan1").unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }
}
