// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles for the engine crate.

use crate::callbacks::{CallbackError, RunCallbacks};
use async_trait::async_trait;
use dagrun_core::{
    CacheEntry, Clock, ComponentView, JobView, LogArtifactRequest, LogCacheRequest, RunStateView,
    WorkflowEvent,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct StoreState {
    next_pk: i64,
    pks: HashMap<String, i64>,
    events: Vec<WorkflowEvent>,
    jobs_by_id: HashMap<String, JobView>,
    latest_views: HashMap<String, JobView>,
    caches: Vec<CacheEntry>,
    artifacts: Vec<LogArtifactRequest>,
    update_failures: u32,
}

/// In-memory external store recording every callback for assertions.
///
/// Behaves the way the engine assumes the real store does: repeated updates
/// for the same `(component, seq)` return a stable pk, and job views are
/// queryable by backend job id.
pub(crate) struct MemoryCallbacks {
    state: Arc<Mutex<StoreState>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCallbacks {
    pub fn new(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self { state: Arc::new(Mutex::new(StoreState::default())), clock })
    }

    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.state.lock().events.clone()
    }

    /// Every job view synced for the given component short-name, in
    /// emission order.
    pub fn job_views(&self, component: &str) -> Vec<JobView> {
        self.state
            .lock()
            .events
            .iter()
            .filter(|e| e.extra.component_name == component)
            .filter_map(|e| match &e.extra.view {
                Some(ComponentView::Job(v)) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }

    /// The last synced view of one runtime (`full_name`, seq).
    pub fn latest_job_view(&self, step_name: &str, seq: usize) -> Option<JobView> {
        self.state.lock().latest_views.get(&runtime_key(step_name, seq)).cloned()
    }

    pub fn cache_entries(&self) -> Vec<CacheEntry> {
        self.state.lock().caches.clone()
    }

    pub fn artifacts_logged(&self) -> Vec<LogArtifactRequest> {
        self.state.lock().artifacts.clone()
    }

    /// Make the next `count` update callbacks fail.
    pub fn fail_next_updates(&self, count: u32) {
        self.state.lock().update_failures = count;
    }

    /// Snapshot of the latest job views as a restartable run state.
    pub fn saved_state(&self) -> RunStateView {
        let state = self.state.lock();
        RunStateView { jobs: state.latest_views.clone() }
    }
}

fn runtime_key(step_name: &str, seq: usize) -> String {
    format!("{step_name}-{seq}")
}

#[async_trait]
impl RunCallbacks for MemoryCallbacks {
    async fn update_runtime(
        &self,
        _run_id: &str,
        event: &WorkflowEvent,
    ) -> Result<i64, CallbackError> {
        let mut state = self.state.lock();
        if state.update_failures > 0 {
            state.update_failures -= 1;
            return Err(CallbackError::Failed("injected update failure".to_string()));
        }

        let pk_key = match &event.extra.view {
            Some(ComponentView::Job(v)) => runtime_key(&v.step_name, v.seq),
            Some(ComponentView::Dag(v)) => format!("dag:{}-{}", v.dag_id, v.seq),
            None => event.extra.component_name.clone(),
        };
        let next = state.next_pk + 1;
        let pk = *state.pks.entry(pk_key).or_insert_with(|| next);
        state.next_pk = state.next_pk.max(pk);

        if let Some(ComponentView::Job(view)) = &event.extra.view {
            if !view.job_id.is_empty() {
                state.jobs_by_id.insert(view.job_id.clone(), view.clone());
            }
            state.latest_views.insert(runtime_key(&view.step_name, view.seq), view.clone());
        }
        state.events.push(event.clone());
        Ok(pk)
    }

    async fn log_cache(&self, req: LogCacheRequest) -> Result<String, CallbackError> {
        let mut state = self.state.lock();
        let entry = CacheEntry {
            run_id: req.run_id,
            job_id: req.job_id,
            first_fp: req.first_fp,
            second_fp: req.second_fp,
            fs_id: req.fs_id,
            source: req.source,
            expired_time: req.expired_time,
            updated_at: self.clock.epoch_ms(),
        };
        state.caches.push(entry);
        Ok(format!("cache-{}", state.caches.len()))
    }

    async fn list_cache(
        &self,
        first_fp: &str,
        fs_id: &str,
        pipeline_source: &str,
    ) -> Result<Vec<CacheEntry>, CallbackError> {
        let state = self.state.lock();
        let mut entries: Vec<CacheEntry> = state
            .caches
            .iter()
            .filter(|c| c.first_fp == first_fp && c.fs_id == fs_id && c.source == pipeline_source)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(entries)
    }

    async fn get_job(
        &self,
        job_id: &str,
        _component_full_name: &str,
    ) -> Result<JobView, CallbackError> {
        self.state
            .lock()
            .jobs_by_id
            .get(job_id)
            .cloned()
            .ok_or_else(|| CallbackError::NotFound(format!("job {job_id}")))
    }

    async fn log_artifact(&self, req: LogArtifactRequest) -> Result<(), CallbackError> {
        self.state.lock().artifacts.push(req);
        Ok(())
    }
}
