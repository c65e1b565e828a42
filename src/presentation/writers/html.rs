use anyhow::Result;
use sailfish::TemplateOnce;

use crate::domain::{comparison::Comparison, ports::OutputWriter};

#[derive(TemplateOnce)]
#[template(path = "html/report.stpl")] // base dir declared inside sailfish.toml
struct ReportTemplate<'a> {
    comparison: &'a Comparison,
}

pub struct HtmlWriter;

impl OutputWriter for HtmlWriter {
    fn format(&self, comparison: &Comparison) -> Result<String> {
        Ok(ReportTemplate { comparison }.render_once()?)
    }

    fn extension(&self) -> &'static str {
        "html"
    }
}
