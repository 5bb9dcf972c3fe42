// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Orchestrator backlog commands
//!
//! Commands: add, list

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use colored::Colorize;
use garden_core::domain::agent::Specialization;
use garden_core::domain::task::{NewTask, Priority, Task};
use garden_swarm::application::{GardenContext, Orchestrator};
use std::path::PathBuf;
use std::sync::Arc;

use super::load_config;

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Add a task to the orchestrator's open backlog
    Add {
        /// What needs doing
        #[arg(value_name = "DESCRIPTION")]
        description: String,

        /// high, medium or low
        #[arg(short, long, default_value = "medium")]
        priority: Priority,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(short, long, value_name = "DATE")]
        due: Option<String>,

        /// Skill required to run the task
        #[arg(short, long)]
        skill: Option<String>,

        /// Estimated duration in minutes
        #[arg(short = 'm', long)]
        minutes: Option<u32>,

        /// Helper specialization this task belongs to
        #[arg(long)]
        specialization: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// List the orchestrator's tasks
    List {
        /// Which collection to show
        #[arg(long, value_enum, default_value = "open")]
        collection: ListCollection,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListCollection {
    Open,
    Assigned,
    Completed,
}

pub async fn handle_command(
    command: TaskCommand,
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<()> {
    let spec = load_config(config_path, data_dir)?;
    let orch = Orchestrator::new(Arc::new(GardenContext::new(spec)));
    orch.ensure_orchestrator().await?;

    match command {
        TaskCommand::Add {
            description,
            priority,
            due,
            skill,
            minutes,
            specialization,
            tags,
        } => {
            let mut new = NewTask::new(description).with_priority(priority);
            if let Some(due) = due {
                new = new.with_due_date(due);
            }
            if let Some(skill) = skill {
                new = new.with_skill(skill);
            }
            if let Some(minutes) = minutes {
                new = new.with_estimate(minutes);
            }
            for tag in tags {
                new = new.with_tag(tag);
            }
            new.specialization = specialization.map(Specialization::from);
            add(&orch, new).await
        }
        TaskCommand::List { collection } => list(&orch, collection).await,
    }
}

async fn add(orch: &Orchestrator, new: NewTask) -> Result<()> {
    let task = orch
        .context()
        .scheduler()
        .add(new)
        .await
        .context("Failed to add task")?;
    println!(
        "{}",
        format!("✓ Added {}: {}", task.id, task.description).green()
    );
    Ok(())
}

async fn list(orch: &Orchestrator, collection: ListCollection) -> Result<()> {
    let scheduler = orch.context().scheduler();
    let tasks = match collection {
        ListCollection::Open => scheduler.prioritize(None).await?,
        ListCollection::Assigned => scheduler.assigned_tasks().await?,
        ListCollection::Completed => scheduler.completed_tasks().await?,
    };

    if tasks.is_empty() {
        println!("{}", "No tasks found".yellow());
        return Ok(());
    }

    println!("{} tasks:", tasks.len());
    for task in &tasks {
        println!("  {}", format_task(task));
    }
    Ok(())
}

fn format_task(task: &Task) -> String {
    let mut line = format!(
        "{} [{}] {}",
        task.id,
        format_priority(task.priority),
        task.description
    );
    if let Some(due) = &task.due_date {
        line.push_str(&format!(" (due {})", due));
    }
    if let Some(helper) = &task.delegated_to {
        line.push_str(&format!(" -> {}", helper));
    }
    line
}

fn format_priority(priority: Priority) -> colored::ColoredString {
    match priority {
        Priority::High => "high".red(),
        Priority::Medium => "medium".yellow(),
        Priority::Low => "low".normal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_core::domain::task::TaskId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn add_then_list_uses_data_dir() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("garden-config.yaml");
        garden_core::domain::config::GardenConfigManifest::default()
            .to_yaml_file(&config)
            .unwrap();

        handle_command(
            TaskCommand::Add {
                description: "Draft the newsletter".into(),
                priority: Priority::High,
                due: Some("2026-01-01".into()),
                skill: None,
                minutes: Some(45),
                specialization: Some("content_creation".into()),
                tags: vec!["weekly".into()],
            },
            Some(config.clone()),
            Some(dir.path().to_path_buf()),
        )
        .await
        .unwrap();

        let spec = load_config(Some(config), Some(dir.path().to_path_buf())).unwrap();
        let ctx = GardenContext::new(spec);
        let open = ctx.scheduler().open_tasks().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, TaskId::from_sequence(1));
        assert_eq!(open[0].specialization, Some(Specialization::ContentCreation));
        assert!(open[0].tags.contains("weekly"));
    }
}
