//! Class table configuration: from repeated command-line lists or a JSON file.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use linefilter_core::{parse_values, ClassDef, ClassTable, ClassValue};
use serde::Deserialize;

// ── JSON schema for --classes ────────────────────────────────────────────────

#[derive(Deserialize)]
struct ClassFile {
    classes: Vec<ClassEntry>,
}

#[derive(Deserialize)]
struct ClassEntry {
    name: String,
    /// Space / comma separated values, `NoData`, or `*`.
    values: String,
    min_steps: Option<usize>,
}

/// "<n> classes, <n> value lists, <n> class specific min-steps ok|ERROR ..."
pub fn count_summary(classes: usize, value_lists: usize, class_steps: usize) -> String {
    let ok = classes == value_lists && (class_steps == 0 || class_steps == classes);
    format!(
        "{classes} classes, {value_lists} value lists, {class_steps} class specific min-steps {}",
        if ok { "ok" } else { "ERROR: MUST BE EQUAL NUMBER OF EACH" }
    )
}

/// Build the table from `--class`, `--values` and `--class-steps` lists.
pub fn table_from_args(
    names: &[String],
    values: &[String],
    class_steps: &[usize],
    min_steps: usize,
) -> Result<ClassTable> {
    println!("{}", count_summary(names.len(), values.len(), class_steps.len()));
    let parsed = values
        .iter()
        .map(|v| parse_values(v))
        .collect::<linefilter_core::Result<Vec<Vec<ClassValue>>>>()?;
    let table = ClassTable::from_lists(names.to_vec(), parsed, class_steps.to_vec(), min_steps)?;
    Ok(table)
}

pub fn parse_table(text: &str, min_steps: usize) -> Result<ClassTable> {
    let file: ClassFile = serde_json::from_str(text).context("Failed to parse class table")?;
    let classes = file
        .classes
        .into_iter()
        .map(|c| {
            let values = parse_values(&c.values)?;
            Ok(ClassDef::new(c.name, values, c.min_steps.unwrap_or(min_steps)))
        })
        .collect::<Result<Vec<ClassDef>>>()?;
    Ok(ClassTable::new(classes)?)
}

/// Load the table from a JSON file; classes without `min_steps` use `min_steps`.
pub fn table_from_file(path: &Path, min_steps: usize) -> Result<ClassTable> {
    let text = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    parse_table(&text, min_steps).with_context(|| format!("Invalid class table {}", path.display()))
}

/// One description line pair per class, in table order.
pub fn describe(table: &ClassTable) -> Vec<String> {
    table
        .classes()
        .iter()
        .map(|c| {
            let values: Vec<String> = c.values.iter().map(ToString::to_string).collect();
            format!(
                "'{}', requires {} step{} in:\n  [{}]",
                c.name,
                c.min_steps,
                if c.min_steps == 1 { "" } else { "s" },
                values.join(", ")
            )
        })
        .collect()
}
