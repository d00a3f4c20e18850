use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use toml::Value;

use crate::error::SourceError;
use crate::models::record::parse_date_text;
use crate::models::source::{RecordSource, SourceRow};

/// 学员 ID 所在列（B 列）
const ID_COLUMN: usize = 1;
/// 开始日期所在列（C 列）
const START_COLUMN: usize = 2;
/// 结束日期所在列（D 列）
const END_COLUMN: usize = 3;

/// 表格导出的 TOML 结构：第一行是表头
#[derive(Debug, Deserialize)]
struct SheetFile {
    rows: Vec<Vec<Value>>,
}

/// 从 TOML 导出文件读取的学员表
///
/// 文件在启动时一次读入，行在遍历时才转换成记录。
#[derive(Debug, Clone)]
pub struct TomlRecordSource {
    path: String,
    rows: Vec<Vec<Value>>,
}

impl TomlRecordSource {
    /// 打开学员表，读不到或格式不对都视为数据源不可用
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SourceError::unavailable(&display, e))?;

        Self::from_toml_str(&display, &content)
    }

    pub fn from_toml_str(path: &str, content: &str) -> Result<Self, SourceError> {
        let sheet: SheetFile = toml::from_str(content).map_err(|e| SourceError::parse(path, e))?;

        tracing::info!("✓ 学员表已加载: {} ({} 行含表头)", path, sheet.rows.len());

        Ok(Self {
            path: path.to_string(),
            rows: sheet.rows,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl RecordSource for TomlRecordSource {
    fn rows(&self) -> Box<dyn Iterator<Item = SourceRow> + Send + '_> {
        Box::new(self.rows.iter().skip(1).map(|cells| row_from_cells(cells)))
    }
}

fn row_from_cells(cells: &[Value]) -> SourceRow {
    let identifier = cell_text(cells.get(ID_COLUMN));
    SourceRow::build(
        &identifier,
        cell_date(cells.get(START_COLUMN)),
        cell_date(cells.get(END_COLUMN)),
    )
}

fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        None => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Integer(i)) => i.to_string(),
        Some(Value::Float(f)) if f.fract() == 0.0 => format!("{}", *f as i64),
        Some(other) => other.to_string(),
    }
}

fn cell_date(cell: Option<&Value>) -> Result<NaiveDate, String> {
    match cell {
        None => Err("未填写".to_string()),
        Some(Value::Datetime(dt)) => dt
            .date
            .and_then(|d| NaiveDate::from_ymd_opt(d.year as i32, d.month as u32, d.day as u32))
            .ok_or_else(|| format!("无效日期 '{}'", dt)),
        Some(Value::String(s)) if s.trim().is_empty() => Err("未填写".to_string()),
        Some(Value::String(s)) => parse_date_text(s).ok_or_else(|| format!("无法解析 '{}'", s)),
        Some(other) => Err(format!("不是日期: {}", other)),
    }
}
