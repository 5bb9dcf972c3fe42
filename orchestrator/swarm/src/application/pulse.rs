// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Pulse - one day or night cycle of the orchestrator
//!
//! The phase is derived from the UTC hour on every invocation; nothing about
//! it is persisted. Callers serialize pulses: at most one runs at a time.
//!
//! Day: drain mailboxes, plan, delegate, execute what is left.
//! Night: drain, refresh perception, collect helper reports, write and send
//! the combined reflection, back up, prune the population, and look for
//! missing helper specializations.
//!
//! A failing task never aborts a pulse. Storage failures outside task
//! execution do.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Day/night state machine

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use garden_core::domain::agent::{Agent, AgentId, Specialization};
use garden_core::domain::events::GardenEvent;
use garden_core::domain::lifecycle::PopulationReport;
use garden_core::domain::memory::{category, MemoryMetadata};
use garden_core::domain::perception::PerceptionSnapshot;
use garden_core::domain::phase::Phase;
use garden_core::domain::task::{DailyPlan, Task, TaskId};
use garden_core::infrastructure::backup::BackupMetadata;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::application::context::GardenContext;
use crate::application::delegation::{
    delegation_instructions, enhance_task, select_helper, task_specialization,
};
use crate::application::synthesis::{
    reflection_file_name, report_subject, synthesize, HelperReport, SynthesisInput,
};
use crate::domain::error::RegistryError;
use crate::domain::message::{Message, MessageKind};

#[derive(Debug, Clone)]
pub struct DayReport {
    /// Orchestrator messages read.
    pub messages_processed: usize,
    /// Task assignments handled by helpers.
    pub helper_tasks_processed: usize,
    pub plan: DailyPlan,
    pub delegated: Vec<(TaskId, AgentId)>,
    pub completed: Vec<TaskId>,
    pub failed: Vec<TaskId>,
    /// No skill could run these; they stay open.
    pub skipped: Vec<TaskId>,
}

#[derive(Debug, Clone)]
pub struct NightReport {
    pub messages_processed: usize,
    pub perception_sources: Vec<String>,
    pub helper_reports: Vec<AgentId>,
    pub reflection_path: PathBuf,
    pub backup: Option<BackupMetadata>,
    pub backups_removed: usize,
    pub population: PopulationReport,
    /// Skills for which a new helper was recommended.
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum PulseReport {
    Day(DayReport),
    Night(NightReport),
}

impl PulseReport {
    pub fn phase(&self) -> Phase {
        match self {
            PulseReport::Day(_) => Phase::Day,
            PulseReport::Night(_) => Phase::Night,
        }
    }
}

pub struct Orchestrator {
    ctx: Arc<GardenContext>,
}

impl Orchestrator {
    pub fn new(ctx: Arc<GardenContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &GardenContext {
        &self.ctx
    }

    pub fn current_phase(&self) -> Phase {
        let pulse = &self.ctx.config.pulse;
        Phase::at(Utc::now(), pulse.day_start_hour, pulse.night_start_hour)
    }

    pub async fn ensure_orchestrator(&self) -> Result<Agent> {
        let cfg = &self.ctx.config.orchestrator;
        self.ctx
            .registry
            .ensure_orchestrator(self.ctx.orchestrator_id(), &cfg.name, &cfg.mission)
            .await
            .context("Failed to initialize orchestrator agent")
    }

    /// Run one pulse. With no explicit phase the clock decides.
    pub async fn run_pulse(&self, phase: Option<Phase>) -> Result<PulseReport> {
        let phase = phase.unwrap_or_else(|| self.current_phase());
        self.ensure_orchestrator().await?;

        metrics::counter!("garden_pulses_total", "phase" => phase.as_str()).increment(1);
        self.ctx.events.publish(GardenEvent::PulseStarted {
            phase: phase.as_str().to_string(),
            started_at: Utc::now(),
        });
        info!(phase = phase.as_str(), "Starting pulse");

        let report = match phase {
            Phase::Day => PulseReport::Day(self.run_day().await?),
            Phase::Night => PulseReport::Night(self.run_night().await?),
        };

        self.ctx.events.publish(GardenEvent::PulseCompleted {
            phase: phase.as_str().to_string(),
            completed_at: Utc::now(),
        });
        info!(phase = phase.as_str(), "Pulse completed");
        Ok(report)
    }

    async fn run_day(&self) -> Result<DayReport> {
        let inbox = self.drain_orchestrator_messages().await?;
        let helper_tasks_processed = self.drain_helper_messages().await?;

        let plan = self
            .ctx
            .scheduler()
            .generate_daily_plan(None)
            .await
            .context("Failed to build daily plan")?;
        info!(
            total = plan.total_tasks,
            high = plan.high_priority_tasks.len(),
            medium = plan.medium_priority_tasks.len(),
            low = plan.low_priority_tasks.len(),
            estimated = %plan.estimated_completion_time,
            "Prioritized backlog"
        );

        let delegated = self.delegate(&plan, &inbox.returned).await?;
        let delegated_ids: BTreeSet<&TaskId> = delegated.iter().map(|(id, _)| id).collect();

        let mut completed = Vec::new();
        let mut failed = Vec::new();
        let mut skipped = Vec::new();
        for task in plan.ordered_tasks() {
            if task.delegated_to.is_some() || delegated_ids.contains(&task.id) {
                continue;
            }
            match self.execute_task(task).await? {
                TaskRun::Completed => completed.push(task.id.clone()),
                TaskRun::Failed => failed.push(task.id.clone()),
                TaskRun::Skipped => skipped.push(task.id.clone()),
            }
        }

        Ok(DayReport {
            messages_processed: inbox.processed,
            helper_tasks_processed,
            delegated,
            completed,
            failed,
            skipped,
            plan,
        })
    }

    async fn run_night(&self) -> Result<NightReport> {
        let ctx = &self.ctx;
        let me = ctx.orchestrator_id();
        let messages_processed = self.drain_orchestrator_messages().await?.processed;

        let perceptions = match ctx.perception.update_all(true).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Perception refresh failed");
                PerceptionSnapshot::new()
            }
        };
        info!(sources = perceptions.len(), "Updated perception sources");

        let helper_reports = self.collect_helper_reports().await?;

        let scheduler = ctx.scheduler();
        let open_tasks = scheduler.open_tasks().await?.len();
        let completed_tasks = scheduler.completed_tasks().await?.len();
        let recent_memories = ctx.memory().recent(10)?;
        let date = Utc::now().date_naive();

        let input = SynthesisInput {
            date,
            perceptions: &perceptions,
            recent_memories: &recent_memories,
            helper_reports: &helper_reports,
            open_tasks,
            completed_tasks,
        };
        let synthesis = synthesize(&input);

        let reflections = ctx.reflections();
        let reflection_path = reflections
            .write_markdown(&reflection_file_name(date), &synthesis.markdown)
            .context("Failed to save nightly reflection")?;
        reflections.create_daily(synthesis.to_daily_reflection(&input))?;
        info!(path = %reflection_path.display(), "Saved nightly reflection");

        if let Err(e) = ctx
            .notifier
            .send(&ctx.config.notifications.recipient, &report_subject(date), &synthesis.markdown)
            .await
        {
            warn!(error = %e, "Failed to send nightly report");
        }

        let backup = match ctx.backups.create(me) {
            Ok(meta) => {
                ctx.events.publish(GardenEvent::BackupCreated {
                    agent_id: me.clone(),
                    timestamp: meta.timestamp.clone(),
                });
                Some(meta)
            }
            Err(e) => {
                warn!(error = %e, "Backup failed");
                None
            }
        };
        let backups_removed = ctx
            .backups
            .cleanup(ctx.config.backups.retention_days)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Backup cleanup failed");
                0
            });

        let population = ctx
            .lifecycle
            .manage_population(Some(me))
            .await
            .context("Population management failed")?;
        for id in &population.retired_ids {
            metrics::counter!("garden_agents_retired_total").increment(1);
            ctx.events.publish(GardenEvent::AgentRetired {
                agent_id: id.clone(),
                reason: population.reasons.get(id).cloned(),
                retired_at: Utc::now(),
            });
        }

        let recommendations = self.evaluate_helper_needs().await?;

        Ok(NightReport {
            messages_processed,
            perception_sources: perceptions.keys().cloned().collect(),
            helper_reports: helper_reports.iter().map(|r| r.agent_id.clone()).collect(),
            reflection_path,
            backup,
            backups_removed,
            population,
            recommendations,
        })
    }

    /// Read the orchestrator's unread mail. Completion reports close the
    /// matching assigned task; failure reports put it back in the backlog.
    async fn drain_orchestrator_messages(&self) -> Result<Inbox> {
        let ctx = &self.ctx;
        let me = ctx.orchestrator_id();
        let messages = ctx
            .bus
            .get_unread_messages(me)
            .await
            .context("Failed to read orchestrator mailbox")?;
        let mut inbox = Inbox {
            processed: messages.len(),
            returned: BTreeSet::new(),
        };
        if messages.is_empty() {
            return Ok(inbox);
        }
        info!(count = messages.len(), "Processing new messages");

        let memory = ctx.memory();
        let scheduler = ctx.scheduler();
        for message in &messages {
            ctx.bus.mark_as_read(me, &message.message_id).await?;
            match &message.kind {
                MessageKind::TaskCompletion { task_id } => {
                    memory.add(
                        format!("Helper agent {} reported: {}", message.sender_id, message.content),
                        category::HELPER_REPORT,
                        vec!["helper_report".to_string(), message.sender_id.to_string()],
                        MemoryMetadata::default(),
                    )?;
                    let result = json!({
                        "completed_by": message.sender_id,
                        "report": message.content,
                    });
                    match scheduler.complete(task_id, Some(result)).await? {
                        Some(_) => {
                            metrics::counter!(
                                "garden_tasks_completed_total",
                                "agent" => "orchestrator"
                            )
                            .increment(1);
                            info!(
                                task_id = %task_id,
                                helper_id = %message.sender_id,
                                "Helper completed task"
                            );
                        }
                        None => debug!(task_id = %task_id, "Completion report for unknown task"),
                    }
                }
                MessageKind::HelperReport => {
                    memory.add(
                        format!("Helper agent {} reported: {}", message.sender_id, message.content),
                        category::HELPER_REPORT,
                        vec!["helper_report".to_string(), message.sender_id.to_string()],
                        MemoryMetadata::default(),
                    )?;
                }
                MessageKind::Error { task_id } => {
                    warn!(
                        sender = %message.sender_id,
                        subject = %message.subject,
                        content = %message.content,
                        "Helper reported an error"
                    );
                    let Some(task_id) = task_id else {
                        continue;
                    };
                    if scheduler.reopen(task_id).await?.is_some() {
                        info!(
                            task_id = %task_id,
                            helper_id = %message.sender_id,
                            "Task returned to backlog"
                        );
                        ctx.events.publish(GardenEvent::TaskReturned {
                            task_id: task_id.clone(),
                            helper_id: message.sender_id.clone(),
                            returned_at: Utc::now(),
                        });
                        inbox.returned.insert((task_id.clone(), message.sender_id.clone()));
                    }
                }
                other => debug!(
                    sender = %message.sender_id,
                    message_type = other.as_str(),
                    "Message read"
                ),
            }
        }
        Ok(inbox)
    }

    /// Let every helper work through its unread task assignments.
    async fn drain_helper_messages(&self) -> Result<usize> {
        let ctx = &self.ctx;
        let me = ctx.orchestrator_id();
        let mut processed = 0;

        for helper in ctx.registry.get_helpers(me).await? {
            let messages = ctx.bus.get_unread_messages(&helper.id).await?;
            if messages.is_empty() {
                continue;
            }
            let Some(instance) = ctx.registry.load_instance(&helper.id).await? else {
                continue;
            };
            let Some(agent) = instance.as_helper() else {
                continue;
            };
            info!(helper_id = %helper.id, count = messages.len(), "Processing helper messages");

            for message in &messages {
                ctx.bus.mark_as_read(&helper.id, &message.message_id).await?;
                let MessageKind::Task { task } = &message.kind else {
                    continue;
                };
                processed += 1;
                if let Err(e) = agent.process_task(task, &ctx.bus).await {
                    warn!(
                        helper_id = %helper.id,
                        task_id = %task.id,
                        error = %e,
                        "Error processing task"
                    );
                    ctx.bus
                        .send(Message::new(
                            helper.id.clone(),
                            me.clone(),
                            format!("Error processing task: {}", message.subject),
                            format!("Error: {}", e),
                            MessageKind::Error {
                                task_id: Some(task.id.clone()),
                            },
                        ))
                        .await?;
                }
            }
        }
        Ok(processed)
    }

    /// Hand plan tasks to helpers by specialization. The assignment message
    /// is sent before the task moves to the assigned collection. A task is
    /// not handed back to a helper that returned it in this same pulse.
    async fn delegate(
        &self,
        plan: &DailyPlan,
        returned: &BTreeSet<(TaskId, AgentId)>,
    ) -> Result<Vec<(TaskId, AgentId)>> {
        let ctx = &self.ctx;
        let me = ctx.orchestrator_id();
        let helpers = ctx.registry.get_helpers(me).await?;
        if helpers.is_empty() {
            return Ok(Vec::new());
        }
        info!(
            tasks = plan.total_tasks,
            helpers = helpers.len(),
            "Evaluating tasks for delegation"
        );

        let scheduler = ctx.scheduler();
        let mut delegated = Vec::new();
        for task in plan.ordered_tasks() {
            if task.delegated_to.is_some() {
                continue;
            }
            let specialization = task_specialization(task);
            let candidates: Vec<Agent> = helpers
                .iter()
                .filter(|h| !returned.contains(&(task.id.clone(), h.id.clone())))
                .cloned()
                .collect();
            let Some(helper) = select_helper(&candidates, &specialization) else {
                continue;
            };

            let mut enhanced = enhance_task(task, &specialization);
            enhanced.delegated_to = Some(helper.id.clone());
            ctx.bus
                .assign_task(
                    me,
                    &helper.id,
                    enhanced,
                    Some(delegation_instructions(&helper.specialization)),
                )
                .await?;
            scheduler
                .assign(&task.id, &helper.id, Some(specialization.clone()))
                .await?;

            info!(
                task_id = %task.id,
                helper_id = %helper.id,
                specialization = %specialization,
                "Delegated task"
            );
            metrics::counter!("garden_tasks_delegated_total").increment(1);
            ctx.events.publish(GardenEvent::TaskDelegated {
                task_id: task.id.clone(),
                helper_id: helper.id.clone(),
                delegated_at: Utc::now(),
            });
            delegated.push((task.id.clone(), helper.id.clone()));
        }
        Ok(delegated)
    }

    async fn execute_task(&self, task: &Task) -> Result<TaskRun> {
        let ctx = &self.ctx;
        let me = ctx.orchestrator_id();

        let Some(skill) = ctx.skills.find_skill_for(task) else {
            info!(
                task_id = %task.id,
                skill = ?task.skill_required,
                "No skill for task, leaving it open"
            );
            ctx.events.publish(GardenEvent::TaskSkipped {
                agent_id: me.clone(),
                task_id: task.id.clone(),
                reason: "no matching skill".to_string(),
            });
            return Ok(TaskRun::Skipped);
        };

        info!(task_id = %task.id, skill = skill.name(), "Executing task");
        let challenges = match skill.execute(task).await {
            Ok(outcome) if outcome.success => {
                ctx.scheduler().complete(&task.id, Some(outcome.output)).await?;
                metrics::counter!("garden_tasks_completed_total", "agent" => "orchestrator")
                    .increment(1);
                ctx.events.publish(GardenEvent::TaskCompleted {
                    agent_id: me.clone(),
                    task_id: task.id.clone(),
                    completed_at: Utc::now(),
                });
                return Ok(TaskRun::Completed);
            }
            Ok(outcome) if outcome.challenges.is_empty() => vec![outcome.summary],
            Ok(outcome) => outcome.challenges,
            Err(e) => vec![e.to_string()],
        };

        warn!(
            task_id = %task.id,
            skill = skill.name(),
            error = ?challenges,
            "Task failed, leaving it open"
        );
        ctx.memory().add(
            format!("Failed to execute task {}: {}", task.id, task.description),
            category::TASK,
            vec!["task_failure".to_string(), skill.name().to_string()],
            MemoryMetadata::task_outcome(
                skill.name(),
                task.id.to_string(),
                false,
                challenges.clone(),
                Vec::new(),
            ),
        )?;
        metrics::counter!("garden_tasks_failed_total", "agent" => "orchestrator").increment(1);
        ctx.events.publish(GardenEvent::TaskFailed {
            agent_id: me.clone(),
            task_id: task.id.clone(),
            error: challenges.join("; "),
            failed_at: Utc::now(),
        });
        Ok(TaskRun::Failed)
    }

    /// Nightly report, daily reflection and improvement plan from every
    /// helper. A helper that fails to report is skipped.
    async fn collect_helper_reports(&self) -> Result<Vec<HelperReport>> {
        let ctx = &self.ctx;
        let helpers = ctx.registry.get_helpers(ctx.orchestrator_id()).await?;
        if !helpers.is_empty() {
            info!(count = helpers.len(), "Collecting reports from helper agents");
        }

        let mut reports = Vec::new();
        for helper in helpers {
            let instance = match ctx.registry.load_instance(&helper.id).await {
                Ok(Some(instance)) => instance,
                Ok(None) => continue,
                Err(e) => {
                    warn!(helper_id = %helper.id, error = %e, "Failed to load helper");
                    continue;
                }
            };
            let Some(agent) = instance.as_helper() else {
                continue;
            };

            let report = match agent.generate_nightly_report() {
                Ok(report) => report,
                Err(e) => {
                    warn!(helper_id = %helper.id, error = %e, "Failed to generate nightly report");
                    continue;
                }
            };
            let daily = agent
                .create_daily_reflection()
                .await
                .map_err(|e| {
                    warn!(helper_id = %helper.id, error = %e, "Failed to create daily reflection")
                })
                .ok();
            let improvement_plan = agent
                .generate_improvement_plan()
                .map_err(|e| {
                    warn!(helper_id = %helper.id, error = %e, "Failed to build improvement plan")
                })
                .ok();

            reports.push(HelperReport {
                agent_id: helper.id.clone(),
                agent_name: helper.name.clone(),
                specialization: helper.specialization.clone(),
                report,
                daily,
                improvement_plan,
            });
        }
        Ok(reports)
    }

    /// Recommend a helper for every skill that has enough completed tasks
    /// and no helper of that specialization yet.
    pub async fn evaluate_helper_needs(&self) -> Result<Vec<String>> {
        let ctx = &self.ctx;
        let me = ctx.orchestrator_id();
        let threshold = ctx.config.helpers.recommendation_threshold;

        let completed = ctx.scheduler().completed_tasks().await?;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for task in &completed {
            let skill = task
                .skill_required
                .clone()
                .or_else(|| task.specialization.as_ref().map(|s| s.as_str().to_string()));
            if let Some(skill) = skill.filter(|s| !s.is_empty() && s != "unknown") {
                *counts.entry(skill).or_insert(0) += 1;
            }
        }

        let existing: BTreeSet<String> = ctx
            .registry
            .get_helpers(me)
            .await?
            .iter()
            .map(|h| h.specialization.as_str().to_lowercase())
            .collect();

        let memory = ctx.memory();
        let mut recommended = Vec::new();
        for (skill, count) in counts {
            if count < threshold || existing.contains(&skill.to_lowercase()) {
                continue;
            }
            info!(skill = %skill, completed = count, "Recommending new helper agent");
            memory.add(
                format!(
                    "Recommended creating a helper agent specialized in {} based on task history analysis.",
                    skill
                ),
                category::RECOMMENDATION,
                vec!["helper_recommendation".to_string(), skill.clone()],
                MemoryMetadata::default(),
            )?;
            ctx.events.publish(GardenEvent::HelperRecommended {
                skill: skill.clone(),
                completed_tasks: count,
            });
            recommended.push(skill);
        }
        Ok(recommended)
    }

    /// Create a helper under the orchestrator, welcome it, and remember
    /// that it was created.
    pub async fn spawn_helper(
        &self,
        name: &str,
        mission: &str,
        specialization: Specialization,
    ) -> Result<(AgentId, Agent), RegistryError> {
        let ctx = &self.ctx;
        let me = ctx.orchestrator_id();
        let (helper_id, helper) = ctx
            .registry
            .create_helper(name, mission, me, specialization.clone())
            .await?;

        ctx.bus
            .send(Message::new(
                me.clone(),
                helper_id.clone(),
                "Welcome to the Agent Garden",
                format!(
                    "Welcome {}! You have been created to help with {} tasks. Your mission is: {}",
                    name, specialization, mission
                ),
                MessageKind::Welcome,
            ))
            .await?;

        ctx.memory().add(
            format!(
                "Created helper agent {} ({}) specialized in {} with mission: {}",
                name, helper_id, specialization, mission
            ),
            category::HELPER_AGENT,
            vec!["helper_creation".to_string(), specialization.as_str().to_string()],
            MemoryMetadata::default(),
        )?;

        ctx.events.publish(GardenEvent::HelperSpawned {
            agent_id: helper_id.clone(),
            parent_id: me.clone(),
            specialization,
            spawned_at: Utc::now(),
        });
        Ok((helper_id, helper))
    }
}

/// What the orchestrator's mailbox held this pulse.
struct Inbox {
    processed: usize,
    /// Tasks a helper reported as failed, with that helper.
    returned: BTreeSet<(TaskId, AgentId)>,
}

enum TaskRun {
    Completed,
    Failed,
    Skipped,
}

/// The next instant at which the phase flips.
pub fn next_phase_boundary(now: DateTime<Utc>, day_start: u32, night_start: u32) -> DateTime<Utc> {
    let today = now.date_naive();
    [Some(today), today.succ_opt()]
        .into_iter()
        .flatten()
        .flat_map(|date| [day_start, night_start].map(|hour| date.and_hms_opt(hour, 0, 0)))
        .flatten()
        .map(|naive| naive.and_utc())
        .filter(|boundary| *boundary > now)
        .min()
        .unwrap_or_else(|| now + chrono::Duration::hours(1))
}
