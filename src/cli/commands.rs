use crate::config::{AllocationPolicy, Settings};
use crate::core::{
    add_material, add_resource, change_material_field, compute_project_progress, monthly_totals,
    project_budget, remove_material, remove_resource, resource_fte, set_allocation_checked,
    task_budget, work_package_budget, work_package_progress, TaskEditor,
};
use crate::error::{PlanError, PlanResult};
use crate::excel::AllocationExporter;
use crate::parser::{self, Severity};
use crate::preview::ImportSession;
use crate::types::{MaterialField, ResourceAssignment, Task, MONTH_LABELS};
use crate::writer;
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

/// Format a number for display, removing unnecessary decimal places
fn format_number(n: f64) -> String {
    let rounded = (n * 1e6).round() / 1e6;
    format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Material edit requested on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialEdit {
    Add,
    Remove(usize),
    Set {
        index: usize,
        field: MaterialField,
        value: String,
    },
}

/// Resource edit requested on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEdit {
    Add(ResourceAssignment),
    Remove(usize),
}

//==============================================================================
// Import
//==============================================================================

/// Execute the import command.
///
/// The serialized preview goes to stdout (the "copy" path) unless `quiet`;
/// with `download` it is also written to `<dir>/converted_data.json`. The
/// summary goes to stderr so stdout can be piped.
pub fn import(
    input: PathBuf,
    download: Option<PathBuf>,
    quiet: bool,
    verbose: bool,
) -> PlanResult<()> {
    eprintln!("{}", "📥 Planboard - Workbook Import".bold().green());
    eprintln!("   Input: {}\n", input.display());

    let mut session = ImportSession::new(Settings::default());
    if let Err(e) = session.load_path(&input) {
        eprintln!("{} {}", "❌".red(), e.user_message().red());
        return Err(e);
    }

    print_import_summary(&session, verbose);

    if !quiet {
        println!("{}", session.copy_text()?);
    }

    if let Some(dir) = download {
        let path = session.download(&dir)?;
        eprintln!("{} {}", "💾 Saved:".cyan(), path.display());
    }

    Ok(())
}

fn print_import_summary(session: &ImportSession, verbose: bool) {
    if let Some(summary) = session.summary() {
        eprintln!("{}", "✅ Preview:".bold().green());
        eprintln!(
            "   {} sheet(s), {} record(s)",
            summary.sheet_count, summary.record_count
        );
        if verbose {
            for (name, count) in &summary.per_sheet {
                eprintln!("   📄 {} ({} records)", name.bright_blue(), count);
            }
        }
        eprintln!();
    }
}

/// Execute the watch command: re-import the workbook whenever it changes.
///
/// A read that fails keeps the previous preview on screen.
pub fn watch(file: PathBuf, verbose: bool) -> PlanResult<()> {
    eprintln!("{}", "👁️  Planboard - Watch Mode".bold().green());
    eprintln!("   Watching: {}", file.display());
    eprintln!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    if !file.exists() {
        return Err(PlanError::NotFound(format!("file {}", file.display())));
    }

    let canonical_path = file.canonicalize()?;
    let parent_dir = canonical_path
        .parent()
        .ok_or_else(|| PlanError::Validation("Cannot determine parent directory".to_string()))?;

    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(Duration::from_millis(200), tx)
        .map_err(|e| PlanError::Validation(format!("Failed to create file watcher: {}", e)))?;
    debouncer
        .watcher()
        .watch(parent_dir, RecursiveMode::NonRecursive)
        .map_err(|e| PlanError::Validation(format!("Failed to watch directory: {}", e)))?;

    let mut session = ImportSession::new(Settings::default());
    reload(&mut session, &canonical_path, verbose);

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any
                        && event.path.file_name() == canonical_path.file_name()
                });
                if relevant {
                    eprintln!("\n{}", "🔄 Change detected".cyan());
                    reload(&mut session, &canonical_path, verbose);
                }
            }
            Ok(Err(error)) => {
                eprintln!("{} Watch error: {}", "❌".red(), error);
            }
            Err(e) => {
                eprintln!("{} Channel error: {}", "❌".red(), e);
                break;
            }
        }
    }

    Ok(())
}

fn reload(session: &mut ImportSession, path: &Path, verbose: bool) {
    match session.load_path(path) {
        Ok(_) => print_import_summary(session, verbose),
        Err(e) => {
            eprintln!("{} {}", "❌".red(), e.user_message().red());
            if session.preview().is_some() {
                eprintln!("   {}", "Keeping the previous preview".yellow());
            }
        }
    }
}

//==============================================================================
// Project reports
//==============================================================================

/// Execute the summary command: progress and budget per work package
pub fn summary(file: PathBuf, verbose: bool) -> PlanResult<()> {
    let project = parser::parse_project(&file)?;

    println!("{}", "📊 Planboard - Project Summary".bold().green());
    println!("   Project: {}\n", project.name.bright_blue().bold());

    for wp in &project.work_packages {
        println!(
            "   📦 {} {}  {}%  budget {}",
            wp.id.cyan(),
            wp.name,
            work_package_progress(wp),
            format_number(work_package_budget(wp))
        );
        if verbose {
            for task in &wp.tasks {
                print_task_line(task);
            }
        }
    }

    println!();
    println!(
        "   Progress: {}",
        format!("{}%", compute_project_progress(&project.work_packages))
            .bold()
            .green()
    );
    println!(
        "   Budget:   {}",
        format_number(project_budget(&project)).bold().green()
    );

    Ok(())
}

fn print_task_line(task: &Task) {
    println!(
        "      {} {} ({} → {}, {:?}) resources {} materials {} budget {}",
        task.id.bright_blue(),
        task.name,
        task.start,
        task.end,
        task.status,
        task.resources.len(),
        task.materials.len(),
        format_number(task_budget(task))
    );
}

/// Print a task's allocation matrix and materials after an edit
fn print_task_detail(task: &Task) {
    println!("{} {}", "🗂️  Task".bold(), task.id.bright_blue().bold());
    let header: Vec<String> = MONTH_LABELS.iter().map(|m| format!("{:>5}", m)).collect();
    println!("   {:<16}{}   FTE", "", header.join(""));
    for resource in task.resources.iter() {
        let cells: Vec<String> = resource
            .allocation
            .values()
            .iter()
            .map(|v| format!("{:>5}", format_number(*v)))
            .collect();
        println!(
            "   {:<16}{}  {}",
            resource.name,
            cells.join(""),
            format_number(resource_fte(resource))
        );
    }
    let totals: Vec<String> = monthly_totals(task)
        .iter()
        .map(|v| format!("{:>5}", format_number(*v)))
        .collect();
    println!("   {:<16}{}", "Total".bold(), totals.join(""));

    for (i, material) in task.materials.iter().enumerate() {
        println!(
            "   #{} {} {} × {} = {}",
            i,
            if material.name.is_empty() { "(unnamed)" } else { material.name.as_str() },
            format_number(material.units),
            format_number(material.unit_price),
            format_number(material.line_total())
        );
    }
    println!("   Budget: {}", format_number(task_budget(task)).bold().green());
}

/// Execute the validate command on one or more project files
pub fn validate(files: Vec<PathBuf>) -> PlanResult<()> {
    let mut failed = 0;

    for file in &files {
        println!("{} {}", "🔍 Validating".bold().green(), file.display());
        match parser::parse_project(file) {
            Ok(project) => {
                let issues = parser::check_project(&project);
                let errors = issues
                    .iter()
                    .filter(|i| i.severity == Severity::Error)
                    .count();
                for issue in &issues {
                    match issue.severity {
                        Severity::Error => println!("   {}", issue.to_string().red()),
                        Severity::Warning => println!("   {}", issue.to_string().yellow()),
                    }
                }
                if errors == 0 {
                    println!("   {}", "✅ Valid".green());
                } else {
                    failed += 1;
                }
            }
            Err(e) => {
                println!("   {} {}", "❌".red(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(PlanError::Validation(format!(
            "{} of {} file(s) failed validation",
            failed,
            files.len()
        )));
    }
    Ok(())
}

//==============================================================================
// Task edits
//==============================================================================

/// Load the project, open the task, apply one edit, write it back.
fn edit_task<F>(file: &Path, task_id: &str, dry_run: bool, edit: F) -> PlanResult<()>
where
    F: FnOnce(&Task) -> PlanResult<Task>,
{
    let project = parser::parse_project(file)?;
    let mut editor = TaskEditor::new(project);
    editor.select(task_id)?;
    let task = editor.try_apply(edit)?;
    print_task_detail(task);
    editor.close();

    if dry_run {
        println!("{}", "📋 Dry run - no changes written".yellow());
        return Ok(());
    }

    let backup = writer::write_project(file, &editor.into_project())?;
    println!("{} {}", "💾 Saved".green(), file.display());
    if let Some(backup) = backup {
        println!("   Backup: {}", backup.display());
    }
    Ok(())
}

/// Execute the allocate command: set one resource × month cell
pub fn allocate(
    file: PathBuf,
    task: String,
    resource: usize,
    month: usize,
    value: String,
    policy: Option<AllocationPolicy>,
    dry_run: bool,
) -> PlanResult<()> {
    let settings = match policy {
        Some(policy) => Settings::default().with_policy(policy),
        None => Settings::default(),
    };
    edit_task(&file, &task, dry_run, |t| {
        if resource >= t.resources.len() {
            return Err(PlanError::NotFound(format!(
                "resource #{} on task '{}' ({} assigned)",
                resource,
                t.id,
                t.resources.len()
            )));
        }
        if month >= MONTH_LABELS.len() {
            return Err(PlanError::Validation(format!(
                "month index {} is outside 0..=11",
                month
            )));
        }
        set_allocation_checked(t, resource, month, &value, settings.allocation_policy)
    })
}

/// Execute the material command
pub fn material(file: PathBuf, task: String, edit: MaterialEdit, dry_run: bool) -> PlanResult<()> {
    edit_task(&file, &task, dry_run, |t| {
        let index = match &edit {
            MaterialEdit::Add => None,
            MaterialEdit::Remove(i) | MaterialEdit::Set { index: i, .. } => Some(*i),
        };
        if let Some(i) = index {
            if i >= t.materials.len() {
                return Err(PlanError::NotFound(format!(
                    "material #{} on task '{}'",
                    i, t.id
                )));
            }
        }
        Ok(match edit {
            MaterialEdit::Add => add_material(t),
            MaterialEdit::Remove(i) => remove_material(t, i),
            MaterialEdit::Set {
                index,
                field,
                value,
            } => change_material_field(t, index, field, &value),
        })
    })
}

/// Execute the resource command
pub fn resource(file: PathBuf, task: String, edit: ResourceEdit, dry_run: bool) -> PlanResult<()> {
    edit_task(&file, &task, dry_run, |t| match edit {
        ResourceEdit::Add(r) => Ok(add_resource(t, r)),
        ResourceEdit::Remove(i) if i < t.resources.len() => Ok(remove_resource(t, i)),
        ResourceEdit::Remove(i) => Err(PlanError::NotFound(format!(
            "resource #{} on task '{}'",
            i, t.id
        ))),
    })
}

/// Execute the export command: one task's allocation matrix to .xlsx
pub fn export(file: PathBuf, task: String, output: PathBuf) -> PlanResult<()> {
    println!("{}", "📤 Planboard - Allocation Export".bold().green());
    let project = parser::parse_project(&file)?;
    let task = project
        .find_task(&task)
        .cloned()
        .ok_or_else(|| PlanError::NotFound(format!("task '{}'", task)))?;

    AllocationExporter::new(task).export(&output)?;
    println!("{} {}", "✅ Written".green(), output.display());
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
