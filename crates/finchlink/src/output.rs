use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A result with a JSON form and a field/value form for humans.
pub trait Report: Serialize {
    fn rows(&self) -> Vec<(&'static str, String)>;
}

pub fn print_report<R: Report>(report: &R, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in report.rows() {
                table.add_row(vec![field.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line = report
                .rows()
                .into_iter()
                .map(|(field, value)| format!("{field}={value}"))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{line}");
        }
    }
}

/// Acknowledgement for a command that has no reply.
#[derive(Serialize)]
pub struct Ack {
    pub command: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Ack {
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            ok: true,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl Report for Ack {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![("command", self.command.to_string()), ("ok", self.ok.to_string())];
        if let Some(detail) = &self.detail {
            rows.push(("detail", detail.clone()));
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_json_omits_empty_detail() {
        let json = serde_json::to_value(Ack::new("halt")).expect("ack should serialize");
        assert_eq!(json["command"], "halt");
        assert_eq!(json["ok"], true);
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn ack_rows_include_detail() {
        let rows = Ack::new("led").with_detail("#FF0000").rows();
        assert_eq!(rows.last(), Some(&("detail", "#FF0000".to_string())));
    }
}
