pub mod toml_loader;
pub mod xlsx_loader;

use std::path::Path;

use crate::error::SourceError;
use crate::models::source::RecordSource;

pub use toml_loader::TomlRecordSource;
pub use xlsx_loader::XlsxRecordSource;

/// 按扩展名选择学员表读取方式：表格文件走 calamine，其余按 TOML 导出读取
pub async fn open_record_source(
    path: impl AsRef<Path>,
    sheet: &str,
) -> Result<Box<dyn RecordSource>, SourceError> {
    let path = path.as_ref().to_path_buf();
    if !is_spreadsheet(&path) {
        return Ok(Box::new(TomlRecordSource::open(&path).await?));
    }

    let display = path.display().to_string();
    let sheet = sheet.to_string();
    let source = tokio::task::spawn_blocking(move || XlsxRecordSource::open(&path, &sheet))
        .await
        .map_err(|e| SourceError::unavailable(display, e))??;
    Ok(Box::new(source))
}

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "xlsx" | "xlsm" | "xlsb" | "xls" | "ods"
            )
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreadsheet_extensions() {
        assert!(is_spreadsheet(Path::new("atestados.xlsx")));
        assert!(is_spreadsheet(Path::new("dados/ATESTADOS.XLS")));
        assert!(is_spreadsheet(Path::new("plan.ods")));
        assert!(!is_spreadsheet(Path::new("atestados.toml")));
        assert!(!is_spreadsheet(Path::new("atestados")));
    }

    #[tokio::test]
    async fn test_open_picks_loader_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("atestados.toml");
        std::fs::write(
            &toml_path,
            "rows = [[\"Nome\", \"ID\", \"Inicio\", \"Fim\"], [\"Ana\", \"S1\", \"01/02/2025\", \"10/02/2025\"]]",
        )
        .unwrap();

        let source = open_record_source(&toml_path, "Plan1").await.unwrap();
        assert_eq!(source.count_until_end(), 1);

        let err = open_record_source(dir.path().join("atestados.xlsx"), "Plan1")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }
}
