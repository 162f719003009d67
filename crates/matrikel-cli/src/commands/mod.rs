//! CLI command implementations

pub mod ldap;
pub mod oauth;

use crate::OutputFormat;
use matrikel_core::config::MatrikelConfig;
use matrikel_core::Student;

/// Context passed to all commands
pub struct CommandContext {
    pub config: MatrikelConfig,
    pub output_format: OutputFormat,
}

impl CommandContext {
    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    /// Print an authentication outcome. Returns whether it succeeded.
    pub fn report(&self, outcome: Result<Student, &'static str>) -> anyhow::Result<bool> {
        println!("{}", self.render(&outcome)?);
        Ok(outcome.is_ok())
    }

    fn render(&self, outcome: &Result<Student, &'static str>) -> anyhow::Result<String> {
        let rendered = match (outcome, self.is_json()) {
            (Ok(student), true) => serde_json::to_string_pretty(student)?,
            (Err(code), true) => serde_json::to_string_pretty(&serde_json::json!({ "error": code }))?,
            (Ok(student), false) => format!(
                "id:       {}\nforename: {}\nsurname:  {}\nemail:    {}",
                student.id, student.forename, student.surname, student.email
            ),
            (Err(code), false) => format!("authentication failed: {}", code),
        };

        Ok(rendered)
    }
}
