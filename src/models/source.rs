//! 学员表数据源

use chrono::NaiveDate;

use super::record::Record;

/// 数据源里的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRow {
    /// 可以处理的记录
    Record(Record),
    /// 有 ID 但日期缺失或无法使用
    Invalid { identifier: String, reason: String },
    /// 空 ID：数据结束标记，即使后面还有行
    EndOfData,
}

impl SourceRow {
    /// 用解析后的单元格构造一行
    pub fn build(
        identifier: &str,
        start: Result<NaiveDate, String>,
        end: Result<NaiveDate, String>,
    ) -> Self {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return SourceRow::EndOfData;
        }

        match (start, end) {
            (Ok(start), Ok(end)) if end < start => SourceRow::Invalid {
                identifier: identifier.to_string(),
                reason: format!("结束日期 {} 早于开始日期 {}", end, start),
            },
            (Ok(start), Ok(end)) => SourceRow::Record(Record::new(identifier, start, end)),
            (Err(reason), _) => SourceRow::Invalid {
                identifier: identifier.to_string(),
                reason: format!("开始日期不可用: {}", reason),
            },
            (_, Err(reason)) => SourceRow::Invalid {
                identifier: identifier.to_string(),
                reason: format!("结束日期不可用: {}", reason),
            },
        }
    }
}

/// 有限、可从头重新遍历的记录序列（表头已经去掉）
pub trait RecordSource: Send + Sync {
    fn rows(&self) -> Box<dyn Iterator<Item = SourceRow> + Send + '_>;

    /// 结束标记之前的行数
    fn count_until_end(&self) -> usize {
        self.rows()
            .take_while(|row| *row != SourceRow::EndOfData)
            .count()
    }
}

/// 内存数据源
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSource {
    rows: Vec<SourceRow>,
}

impl InMemoryRecordSource {
    pub fn new(rows: Vec<SourceRow>) -> Self {
        Self { rows }
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        Self::new(records.into_iter().map(SourceRow::Record).collect())
    }
}

impl RecordSource for InMemoryRecordSource {
    fn rows(&self) -> Box<dyn Iterator<Item = SourceRow> + Send + '_> {
        Box::new(self.rows.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, d).unwrap()
    }

    #[test]
    fn test_blank_identifier_is_end_of_data() {
        assert_eq!(SourceRow::build("  ", Ok(date(1)), Ok(date(2))), SourceRow::EndOfData);
    }

    #[test]
    fn test_missing_dates_are_invalid() {
        let row = SourceRow::build("S1", Err("缺少日期".into()), Ok(date(2)));
        assert!(matches!(row, SourceRow::Invalid { ref identifier, .. } if identifier == "S1"));
    }

    #[test]
    fn test_reversed_period_is_invalid() {
        let row = SourceRow::build("S1", Ok(date(10)), Ok(date(1)));
        assert!(matches!(row, SourceRow::Invalid { .. }));
    }

    #[test]
    fn test_count_stops_at_end_of_data() {
        let source = InMemoryRecordSource::new(vec![
            SourceRow::build("S1", Ok(date(1)), Ok(date(2))),
            SourceRow::build("S2", Err("x".into()), Ok(date(2))),
            SourceRow::EndOfData,
            SourceRow::build("S3", Ok(date(1)), Ok(date(2))),
        ]);
        assert_eq!(source.count_until_end(), 2);
        // 可以从头再来一遍
        assert_eq!(source.rows().count(), 4);
    }
}
