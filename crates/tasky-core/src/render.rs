//! Plain-text tables for the command-line client.

use crate::coerce::format_instant;
use crate::events;
use crate::task::Task;

pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    // Multi-line cells spill into continuation rows.
    let mut lines: Vec<Vec<&str>> = Vec::new();
    for row in rows {
        let split: Vec<Vec<&str>> = row.iter().map(|cell| cell.split('\n').collect()).collect();
        let height = split.iter().map(Vec::len).max().unwrap_or(1);
        for line_idx in 0..height {
            lines.push(
                split
                    .iter()
                    .map(|cell| cell.get(line_idx).copied().unwrap_or(""))
                    .collect(),
            );
        }
    }

    let columns = headers
        .len()
        .max(lines.iter().map(Vec::len).max().unwrap_or(0));
    let mut widths = vec![0usize; columns];
    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = header.chars().count();
    }
    for line in &lines {
        for (idx, cell) in line.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let mut out = Vec::new();
    if !headers.is_empty() {
        out.push(join_padded(headers, &widths));
        let dashes: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        let dashes: Vec<&str> = dashes.iter().map(String::as_str).collect();
        out.push(join_padded(&dashes, &widths));
    }
    for line in &lines {
        out.push(join_padded(line, &widths));
    }
    out.join("\n")
}

fn join_padded(cells: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| format!("{:<width$}", cell, width = widths[idx]))
        .collect();
    padded.join("  ").trim_end().to_string()
}

fn tags_cell(task: &Task) -> String {
    task.tags
        .iter()
        .map(|tag| format!("+{tag}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn assigned_cell(task: &Task) -> String {
    task.assigned
        .iter()
        .map(|name| format!("@{name}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn rank_cell(task: &Task) -> String {
    task.rank.map(|rank| rank.to_string()).unwrap_or_default()
}

fn due_cell(task: &Task) -> String {
    task.due.map(format_instant).unwrap_or_default()
}

pub fn render_active_tasks(slots: &[Option<Task>]) -> String {
    let rows: Vec<Vec<String>> = slots
        .iter()
        .enumerate()
        .filter_map(|(id, slot)| slot.as_ref().map(|task| (id, task)))
        .map(|(id, task)| {
            vec![
                id.to_string(),
                task.title.clone(),
                task.project.clone().unwrap_or_default(),
                tags_cell(task),
                assigned_cell(task),
                rank_cell(task),
                due_cell(task),
            ]
        })
        .collect();
    render_table(
        &["ID", "Title", "Project", "Tags", "Assigned", "Rank", "Due"],
        &rows,
    )
}

pub fn render_task_detail(task: &Task) -> String {
    let rows = vec![
        vec!["Title:".to_string(), task.title.clone()],
        vec!["Description:".to_string(), task.description.clone()],
        vec!["Status:".to_string(), task.status.clone()],
        vec!["Project:".to_string(), task.project.clone().unwrap_or_default()],
        vec!["Tags:".to_string(), tags_cell(task)],
        vec!["Assigned:".to_string(), assigned_cell(task)],
        vec!["Rank:".to_string(), rank_cell(task)],
        vec!["Due:".to_string(), due_cell(task)],
        vec!["Created:".to_string(), format_instant(task.created)],
    ];
    let mut out = render_table(&["Attribute", "Value"], &rows);

    let history: Vec<Vec<String>> = events::render(&task.events)
        .into_iter()
        .map(|line| vec![line.text, line.when])
        .collect();
    if !history.is_empty() {
        out.push_str("\n\n");
        out.push_str(&render_table(&["Event", "When"], &history));
    }
    out
}
