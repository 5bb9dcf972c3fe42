// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! End-to-end pulse runs against a temporary garden directory.

use std::sync::Arc;

use async_trait::async_trait;
use garden_core::domain::agent::Specialization;
use garden_core::domain::config::{GardenConfigSpec, PerceptionSourceConfig};
use garden_core::domain::events::GardenEvent;
use garden_core::domain::memory::category;
use garden_core::domain::perception::Notifier;
use garden_core::domain::phase::Phase;
use garden_core::domain::task::{NewTask, Priority};
use garden_swarm::application::{GardenContext, Orchestrator, PulseReport};
use garden_swarm::domain::{MessageKind, RegistryError};
use parking_lot::Mutex;
use tempfile::TempDir;

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .push((recipient.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

fn config(dir: &TempDir) -> GardenConfigSpec {
    let mut config = GardenConfigSpec {
        data_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    config.perception.enabled = false;
    config
}

fn orchestrator(dir: &TempDir) -> Orchestrator {
    Orchestrator::new(Arc::new(GardenContext::new(config(dir))))
}

fn day(report: PulseReport) -> garden_swarm::application::DayReport {
    match report {
        PulseReport::Day(day) => day,
        PulseReport::Night(_) => panic!("expected a day report"),
    }
}

fn night(report: PulseReport) -> garden_swarm::application::NightReport {
    match report {
        PulseReport::Night(night) => night,
        PulseReport::Day(_) => panic!("expected a night report"),
    }
}

#[tokio::test]
async fn spawn_helper_requires_orchestrator_record() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(&dir);

    let err = orch
        .spawn_helper("Scout", "Find things", Specialization::Research)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::ParentNotFound(_)));
}

#[tokio::test]
async fn spawn_helper_sends_welcome_and_remembers() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(&dir);
    orch.ensure_orchestrator().await.unwrap();
    let mut events = orch.context().events.subscribe();

    let (helper_id, helper) = orch
        .spawn_helper("Scout", "Find savings research", Specialization::Research)
        .await
        .unwrap();
    assert_eq!(helper.specialization, Specialization::Research);

    let ctx = orch.context();
    let inbox = ctx.bus.get_unread_messages(&helper_id).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, MessageKind::Welcome);
    assert_eq!(inbox[0].subject, "Welcome to the Agent Garden");
    assert!(inbox[0].content.contains("help with research tasks"));

    let memories = ctx.memory().all().unwrap();
    assert!(memories
        .iter()
        .any(|m| m.category == category::HELPER_AGENT && m.content.contains("Scout")));

    assert!(events
        .drain()
        .iter()
        .any(|e| matches!(
            e,
            GardenEvent::HelperSpawned { agent_id, .. } if *agent_id == helper_id
        )));
}

#[tokio::test]
async fn delegated_task_round_trips_through_helper() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(&dir);
    orch.ensure_orchestrator().await.unwrap();
    let (helper_id, _) = orch
        .spawn_helper("Scout", "Find things", Specialization::Research)
        .await
        .unwrap();

    let ctx = orch.context();
    let task = ctx
        .scheduler()
        .add(NewTask::new("Research village savings groups").with_priority(Priority::High))
        .await
        .unwrap();

    // First pulse hands the task to the research helper.
    let first = day(orch.run_pulse(Some(Phase::Day)).await.unwrap());
    assert_eq!(first.delegated, vec![(task.id.clone(), helper_id.clone())]);
    assert!(first.completed.is_empty());
    let assigned = ctx.scheduler().assigned_tasks().await.unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].delegated_to.as_ref(), Some(&helper_id));
    assert!(ctx.scheduler().open_tasks().await.unwrap().is_empty());

    // Second pulse lets the helper work and report back.
    let second = day(orch.run_pulse(Some(Phase::Day)).await.unwrap());
    assert_eq!(second.helper_tasks_processed, 1);
    assert!(ctx.layout.outputs_dir(&helper_id).join(format!("{}.md", task.id)).exists());

    // Third pulse reads the completion report.
    let third = day(orch.run_pulse(Some(Phase::Day)).await.unwrap());
    assert_eq!(third.messages_processed, 1);
    assert!(ctx.scheduler().assigned_tasks().await.unwrap().is_empty());
    let completed = ctx.scheduler().completed_tasks().await.unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, task.id);
    assert_eq!(completed[0].result.as_ref().unwrap()["completed_by"], helper_id.as_str());

    let memories = ctx.memory().all().unwrap();
    assert!(memories.iter().any(|m| m.category == category::HELPER_REPORT));

    // The helper's nightly reflection feeds its archival summary.
    orch.run_pulse(Some(Phase::Night)).await.unwrap();
    let summary = ctx.lifecycle.compress_memory(&helper_id).await.unwrap();
    assert!(summary
        .key_learnings
        .iter()
        .any(|l| l.contains("Research village savings groups")));
}

#[tokio::test]
async fn helper_completions_count_towards_recommendations() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(&dir);
    orch.ensure_orchestrator().await.unwrap();
    orch.spawn_helper("Handyman", "Do what is needed", Specialization::General)
        .await
        .unwrap();

    let ctx = orch.context();
    for n in 0..3 {
        ctx.scheduler()
            .add(NewTask::new(format!("Monitor uptime {}", n)))
            .await
            .unwrap();
    }

    let first = day(orch.run_pulse(Some(Phase::Day)).await.unwrap());
    assert_eq!(first.delegated.len(), 3);
    let assigned = ctx.scheduler().assigned_tasks().await.unwrap();
    assert!(assigned
        .iter()
        .all(|t| t.specialization == Some(Specialization::Monitoring)));

    orch.run_pulse(Some(Phase::Day)).await.unwrap();
    orch.run_pulse(Some(Phase::Day)).await.unwrap();
    assert_eq!(ctx.scheduler().completed_tasks().await.unwrap().len(), 3);

    assert_eq!(
        orch.evaluate_helper_needs().await.unwrap(),
        vec!["monitoring".to_string()]
    );
}

#[tokio::test]
async fn failed_delegation_returns_task_to_backlog() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(&dir);
    orch.ensure_orchestrator().await.unwrap();
    let (helper_id, _) = orch
        .spawn_helper("Handyman", "Do what is needed", Specialization::General)
        .await
        .unwrap();

    let ctx = orch.context();
    let me = ctx.orchestrator_id().clone();
    let task = ctx
        .scheduler()
        .add(NewTask::new("Translate the brochure").with_skill("translation"))
        .await
        .unwrap();

    let first = day(orch.run_pulse(Some(Phase::Day)).await.unwrap());
    assert_eq!(first.delegated, vec![(task.id.clone(), helper_id.clone())]);

    // The helper has no skill for it and reports the failure upward.
    let second = day(orch.run_pulse(Some(Phase::Day)).await.unwrap());
    assert_eq!(second.helper_tasks_processed, 1);
    let inbox = ctx.bus.get_unread_messages(&me).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].sender_id, helper_id);
    assert_eq!(
        inbox[0].kind,
        MessageKind::Error {
            task_id: Some(task.id.clone())
        }
    );
    assert!(inbox[0].content.starts_with("Error: "));

    // Reading the report puts the task back in the backlog. The helper that
    // just failed it is passed over for this pulse.
    let mut events = ctx.events.subscribe();
    let third = day(orch.run_pulse(Some(Phase::Day)).await.unwrap());
    assert!(third.delegated.is_empty());
    assert_eq!(third.skipped, vec![task.id.clone()]);
    assert!(ctx.scheduler().assigned_tasks().await.unwrap().is_empty());
    let open = ctx.scheduler().open_tasks().await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, task.id);
    assert!(open[0].delegated_to.is_none());
    assert!(events.drain().iter().any(
        |e| matches!(e, GardenEvent::TaskReturned { task_id, .. } if *task_id == task.id)
    ));

    // And it is reconsidered on the next one.
    let fourth = day(orch.run_pulse(Some(Phase::Day)).await.unwrap());
    assert_eq!(fourth.delegated, vec![(task.id.clone(), helper_id)]);
}

#[tokio::test]
async fn orchestrator_runs_tasks_itself_without_helpers() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(&dir);
    let ctx = orch.context();
    orch.ensure_orchestrator().await.unwrap();

    ctx.scheduler().add(NewTask::new("Tidy the notes")).await.unwrap();
    ctx.scheduler()
        .add(NewTask::new("Translate the report").with_skill("translation"))
        .await
        .unwrap();

    let report = day(orch.run_pulse(Some(Phase::Day)).await.unwrap());
    assert!(report.delegated.is_empty());
    assert_eq!(report.plan.total_tasks, 2);
    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.skipped.len(), 1);

    let open = ctx.scheduler().open_tasks().await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].skill_required.as_deref(), Some("translation"));
}

#[tokio::test]
async fn night_pulse_writes_reflection_and_recommends_helper() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("news.json"),
        r#"{"insights": ["Mobile money adoption is rising"]}"#,
    )
    .unwrap();

    let mut cfg = config(&dir);
    cfg.perception.sources.push(PerceptionSourceConfig {
        name: "news".to_string(),
        path: "news.json".into(),
        frequency_minutes: 60,
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = GardenContext::new(cfg).with_notifier(notifier.clone());
    let orch = Orchestrator::new(Arc::new(ctx));
    orch.ensure_orchestrator().await.unwrap();

    let ctx = orch.context();
    for n in 0..3 {
        ctx.scheduler()
            .add(NewTask::new(format!("Check uptime {}", n)).with_skill("monitoring"))
            .await
            .unwrap();
    }
    let day_report = day(orch.run_pulse(Some(Phase::Day)).await.unwrap());
    assert_eq!(day_report.completed.len(), 3);

    let report = night(orch.run_pulse(Some(Phase::Night)).await.unwrap());
    assert_eq!(report.recommendations, vec!["monitoring".to_string()]);
    assert_eq!(report.perception_sources, vec!["news".to_string()]);
    assert!(report.backup.is_some());
    assert!(report.population.retired_ids.is_empty());

    let markdown = std::fs::read_to_string(&report.reflection_path).unwrap();
    assert!(markdown.contains("## Perception Insights"));
    assert!(markdown.contains("Mobile money adoption is rising"));
    assert!(report
        .reflection_path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .ends_with("_reflection.md"));

    let sent = notifier.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "admin@example.com");
    assert!(sent[0].1.starts_with("Agent Garden Daily Report - "));

    let memories = ctx.memory().all().unwrap();
    assert!(memories
        .iter()
        .any(|m| m.category == category::RECOMMENDATION
            && m.tags.contains(&"monitoring".to_string())));
}

#[tokio::test]
async fn existing_helper_suppresses_recommendation() {
    let dir = TempDir::new().unwrap();
    let orch = orchestrator(&dir);
    orch.ensure_orchestrator().await.unwrap();
    let ctx = orch.context();

    for n in 0..3 {
        ctx.scheduler()
            .add(NewTask::new(format!("Check uptime {}", n)).with_skill("monitoring"))
            .await
            .unwrap();
    }
    orch.run_pulse(Some(Phase::Day)).await.unwrap();
    orch.spawn_helper("Watcher", "Watch things", Specialization::Monitoring)
        .await
        .unwrap();

    assert!(orch.evaluate_helper_needs().await.unwrap().is_empty());
}
