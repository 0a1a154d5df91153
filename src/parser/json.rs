use crate::config::SolverConfig;
use crate::error::{Result, TimetableError};
use crate::types::{
    Classroom, Duty, FixedAssignment, Instance, LessonGroup, Location, Subject, Teacher, TimeGrid,
};
use std::fs;
use std::path::Path;

/// Load all seven entity files plus `config.toml` from a directory,
/// mirroring the teacher's `load_input_from_dir`.
pub fn load_instance_from_dir(dir: &Path) -> Result<Instance> {
    let teachers = load_teachers(&dir.join("teachers.json"))?;
    let classrooms = load_classrooms(&dir.join("classrooms.json"))?;
    let subjects = load_subjects(&dir.join("subjects.json"))?;
    let locations = load_locations(&dir.join("locations.json"))?;
    let fixed_assignments = load_fixed_assignments(&dir.join("fixed_assignments.json"))?;
    let lesson_groups = load_lesson_groups(&dir.join("lesson_groups.json"))?;
    let duties = load_duties(&dir.join("duties.json"))?;
    let time_grid = load_time_grid(&dir.join("time_grid.json"))?;
    let config = load_config_or_default(&dir.join("config.toml"));

    Ok(Instance {
        teachers,
        classrooms,
        subjects,
        locations,
        fixed_assignments,
        lesson_groups,
        duties,
        time_grid,
        config,
    })
}

pub fn load_teachers(path: &Path) -> Result<Vec<Teacher>> {
    load_json_file(path)
}

pub fn load_classrooms(path: &Path) -> Result<Vec<Classroom>> {
    load_json_file(path)
}

pub fn load_subjects(path: &Path) -> Result<Vec<Subject>> {
    load_json_file(path)
}

pub fn load_locations(path: &Path) -> Result<Vec<Location>> {
    load_json_file(path)
}

pub fn load_fixed_assignments(path: &Path) -> Result<Vec<FixedAssignment>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_json_file(path)
}

pub fn load_lesson_groups(path: &Path) -> Result<Vec<LessonGroup>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_json_file(path)
}

pub fn load_duties(path: &Path) -> Result<Vec<Duty>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_json_file(path)
}

pub fn load_time_grid(path: &Path) -> Result<TimeGrid> {
    load_json_file(path)
}

/// Load config from TOML file, or use defaults, matching the teacher's
/// `load_config_or_default`.
pub fn load_config_or_default(path: &Path) -> SolverConfig {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => SolverConfig::default(),
        }
    } else {
        SolverConfig::default()
    }
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let path_str = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| TimetableError::FileRead {
        path: path_str.clone(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| {
        TimetableError::JsonParse {
            file: path_str,
            message: e.to_string(),
        }
        .into()
    })
}
