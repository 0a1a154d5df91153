mod json;
mod markdown;
mod text;

pub use json::*;
pub use markdown::*;
pub use text::*;

use crate::error::Result;
use crate::model::compiler::CompiledModel;
use crate::solver::SolveOutcome;
use crate::types::Instance;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

/// Output format for a rendered report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
}

/// One of the hardest lesson units to place, for the report's "what to
/// look at first" section: fewest admissible (day, start, teacher-tuple)
/// combinations at compile time.
pub struct HardestUnit {
    pub subject_name: String,
    pub classroom_names: Vec<String>,
    pub eligible_tuple_count: usize,
    pub span: u8,
}

/// Everything a rendered report needs: the raw `SolveOutcome`, enough of
/// the instance to turn ids into names, and a difficulty ranking computed
/// once up front rather than per renderer.
pub struct SolverReport<'a> {
    pub outcome: &'a SolveOutcome,
    pub instance: &'a Instance,
    pub hardest_units: Vec<HardestUnit>,
    pub generated_at: DateTime<Utc>,
}

impl<'a> SolverReport<'a> {
    pub fn new(
        outcome: &'a SolveOutcome,
        instance: &'a Instance,
        model: &CompiledModel,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            outcome,
            instance,
            hardest_units: hardest_units(model, instance, 5),
            generated_at,
        }
    }

    fn subject_name(&self, id: &crate::types::SubjectId) -> &str {
        self.instance
            .subjects
            .iter()
            .find(|s| &s.id == id)
            .map(|s| s.name.as_str())
            .unwrap_or("unknown subject")
    }

    fn classroom_name(&self, id: &crate::types::ClassroomId) -> &str {
        self.instance
            .classrooms
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.name.as_str())
            .unwrap_or("unknown classroom")
    }

    fn teacher_name(&self, id: &crate::types::TeacherId) -> &str {
        self.instance
            .teachers
            .iter()
            .find(|t| &t.id == id)
            .map(|t| t.name.as_str())
            .unwrap_or("unknown teacher")
    }
}

fn hardest_units(model: &CompiledModel, instance: &Instance, top_n: usize) -> Vec<HardestUnit> {
    let mut units: Vec<&crate::model::compiler::LessonUnit> = model.units.iter().collect();
    units.sort_by_key(|u| u.eligible_tuples.len());
    units
        .into_iter()
        .take(top_n)
        .map(|u| {
            let subject_name = instance
                .subjects
                .iter()
                .find(|s| s.id == u.subject_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| u.subject_id.to_string());
            let classroom_names = u
                .classroom_idxs
                .iter()
                .map(|&idx| model.classrooms[idx].id.to_string())
                .collect();
            HardestUnit {
                subject_name,
                classroom_names,
                eligible_tuple_count: u.eligible_tuples.len(),
                span: u.span,
            }
        })
        .collect()
}

/// Render and write every requested format into `output_dir`.
pub fn generate_reports(report: &SolverReport, output_dir: &Path, formats: &[OutputFormat]) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    for format in formats {
        match format {
            OutputFormat::Json => {
                let json = generate_json_report(report)?;
                fs::write(output_dir.join("report.json"), json)?;
            }
            OutputFormat::Markdown => {
                let md = generate_markdown_report(report);
                fs::write(output_dir.join("report.md"), md)?;
            }
            OutputFormat::Text => {
                let txt = generate_text_report(report);
                fs::write(output_dir.join("report.txt"), txt)?;
            }
        }
    }

    Ok(())
}
