use crate::domain::{comparison::Comparison, ports::OutputWriter};
use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use self::{html::HtmlWriter, json::JsonWriter, text::TextWriter};

pub mod html;
pub mod json;
pub mod text;

/// Register available writers - OCP: add new ones without touching main.rs
pub fn all_writers() -> Vec<Box<dyn OutputWriter>> {
    vec![
        Box::new(JsonWriter),
        Box::new(TextWriter),
        Box::new(HtmlWriter),
    ]
}

pub fn writer_for(format: &str) -> Option<Box<dyn OutputWriter>> {
    match format {
        "json" => Some(Box::new(JsonWriter)),
        "txt" | "text" => Some(Box::new(TextWriter)),
        "html" => Some(Box::new(HtmlWriter)),
        _ => None,
    }
}

/// Writes the comparison to disk via the chosen writer and returns the file path
pub fn write_to_file(
    writer: &dyn OutputWriter,
    comparison: &Comparison,
    dir: &str,
) -> Result<PathBuf> {
    // Ensure the output directory exists
    fs::create_dir_all(dir)?;

    let content = writer.format(comparison)?;
    let path = PathBuf::from(dir).join(format!(
        "{}.{}",
        comparison.report_id,
        writer.extension()
    ));
    fs::write(&path, &content)?;
    Ok(path)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_for_known_formats() {
        assert_eq!(writer_for("json").unwrap().extension(), "json");
        assert_eq!(writer_for("text").unwrap().extension(), "txt");
        assert_eq!(writer_for("html").unwrap().extension(), "html");
        assert!(writer_for("sql").is_none());
    }

    #[test]
    fn write_to_file_names_file_after_report() {
        let dir = tempfile::tempdir().unwrap();
        let cmp = fixtures::drifted();
        let out = dir.path().join("reports");

        let path = write_to_file(&TextWriter, &cmp, out.to_str().unwrap()).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("{}.txt", cmp.report_id)
        );
        assert!(fs::read_to_string(&path).unwrap().contains("users"));
    }
}
