//! 数据集加载：JSON 数组（`.json`）或 JSON Lines（其它扩展名）

use std::path::Path;

use crate::core::AgentError;
use crate::dataset::{Dataset, Record};

/// 从文件加载数据集；名称取文件名（不含扩展名）
pub fn load_dataset(path: &Path) -> Result<Dataset, AgentError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AgentError::Dataset(format!("Failed to read {}: {}", path.display(), e)))?;

    let is_json_array = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let records = if is_json_array {
        serde_json::from_str::<Vec<Record>>(&raw)
            .map_err(|e| AgentError::Dataset(format!("{}: {}", path.display(), e)))?
    } else {
        parse_json_lines(&raw)
            .map_err(|e| AgentError::Dataset(format!("{}: {}", path.display(), e)))?
    };

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset")
        .to_string();

    tracing::info!(dataset = %name, rows = records.len(), "dataset loaded");
    Ok(Dataset::new(name, records))
}

fn parse_json_lines(raw: &str) -> Result<Vec<Record>, String> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<Record>(line).map_err(|e| format!("line {}: {}", i + 1, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LINE: &str = r#"{"instruction":"cancel it","category":"CANCEL","intent":"cancel_order","response":"Done."}"#;

    #[test]
    fn test_load_json_lines() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, "{LINE}").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{LINE}").unwrap();

        let ds = load_dataset(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].intent, "cancel_order");
    }

    #[test]
    fn test_load_json_array() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "[{LINE}]").unwrap();

        let ds = load_dataset(file.path()).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_load_reports_bad_line() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, "{LINE}").unwrap();
        writeln!(file, "not json").unwrap();

        let err = load_dataset(file.path()).unwrap_err();
        assert!(matches!(err, AgentError::Dataset(ref m) if m.contains("line 2")));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_dataset(Path::new("/nonexistent/data.jsonl")).unwrap_err();
        assert!(matches!(err, AgentError::Dataset(_)));
    }
}
