//! In-memory remote repository that records every call in order.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use prettysync_core::{
    ActivationMessage, ActivationResult, Discovery, Expander, InactiveObject, Include, Lock,
    MainProgram, ObjectDescriptor, SessionType, Transport, TransportError,
};
use prettysync_format::{FormatError, Formatter};
use prettysync_sync::{IncludeOutcome, SyncError, SyncObserver, SyncStats};

/// Route library log records to the test output (`RUST_LOG=debug`).
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn include(include_type: &str, name: &str) -> Include {
    let meta_url = format!("/repo/{}", name.to_ascii_lowercase());
    Include {
        include_type: include_type.to_string(),
        name: name.to_string(),
        part: None,
        source_url: format!("{meta_url}/source/main"),
        meta_url,
    }
}

pub fn remote_error(category: &str, message: &str) -> TransportError {
    TransportError::Remote {
        category: category.to_string(),
        message: message.to_string(),
    }
}

pub fn inactive(name: &str) -> InactiveObject {
    InactiveObject {
        object_type: "CLAS/OC".to_string(),
        name: name.to_string(),
        url: format!("/repo/{}", name.to_ascii_lowercase()),
        parent_url: None,
    }
}

#[derive(Default)]
pub struct FakeRemote {
    pub calls: RefCell<Vec<String>>,
    pub sources: RefCell<HashMap<String, String>>,
    includes: HashMap<String, Vec<Include>>,
    locks: RefCell<HashMap<String, Result<Lock, TransportError>>>,
    pub write_error: RefCell<Option<TransportError>>,
    pub expand_error: RefCell<Option<TransportError>>,
    activations: RefCell<VecDeque<ActivationResult>>,
    main_programs: RefCell<Vec<MainProgram>>,
    discovered: RefCell<Vec<ObjectDescriptor>>,
    next_handle: Cell<usize>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `object_name` as expanding to `includes`, each with its
    /// current source text.
    pub fn with_object(mut self, object_name: &str, includes: Vec<(Include, &str)>) -> Self {
        let mut list = Vec::new();
        for (include, source) in includes {
            self.sources
                .borrow_mut()
                .insert(include.source_url.clone(), source.to_string());
            list.push(include);
        }
        self.includes.insert(object_name.to_string(), list);
        self
    }

    pub fn lock_result(&self, meta_url: &str, result: Result<Lock, TransportError>) {
        self.locks.borrow_mut().insert(meta_url.to_string(), result);
    }

    pub fn queue_activation(&self, result: ActivationResult) {
        self.activations.borrow_mut().push_back(result);
    }

    pub fn set_main_programs(&self, programs: Vec<MainProgram>) {
        *self.main_programs.borrow_mut() = programs;
    }

    pub fn set_discovered(&self, objects: Vec<ObjectDescriptor>) {
        *self.discovered.borrow_mut() = objects;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl Transport for FakeRemote {
    fn set_session_type(&self, session: SessionType) -> Result<(), TransportError> {
        self.record(format!("session {session}"));
        Ok(())
    }

    fn drop_session(&self) -> Result<(), TransportError> {
        self.record("drop session".to_string());
        Ok(())
    }

    fn lock(&self, url: &str) -> Result<Lock, TransportError> {
        self.record(format!("lock {url}"));
        if let Some(result) = self.locks.borrow().get(url) {
            return result.clone();
        }
        let n = self.next_handle.get() + 1;
        self.next_handle.set(n);
        Ok(Lock {
            handle: Some(format!("H{n}")),
            is_local: true,
            tracking_id: None,
        })
    }

    fn unlock(&self, url: &str, handle: &str) -> Result<(), TransportError> {
        self.record(format!("unlock {url} {handle}"));
        Ok(())
    }

    fn get_object_source(&self, url: &str) -> Result<String, TransportError> {
        self.record(format!("read {url}"));
        self.sources
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| remote_error("ExceptionResourceNotFound", url))
    }

    fn set_object_source(
        &self,
        url: &str,
        source: &str,
        handle: &str,
        tracking_id: Option<&str>,
    ) -> Result<(), TransportError> {
        self.record(format!("write {url} {handle} {}", tracking_id.unwrap_or("-")));
        if let Some(err) = self.write_error.borrow().clone() {
            return Err(err);
        }
        self.sources
            .borrow_mut()
            .insert(url.to_string(), source.to_string());
        Ok(())
    }

    fn activate(
        &self,
        name: &str,
        url: &str,
        main_program: Option<&str>,
    ) -> Result<ActivationResult, TransportError> {
        self.record(format!("activate {name} {url} {}", main_program.unwrap_or("-")));
        Ok(self
            .activations
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(ActivationResult::succeeded))
    }

    fn activate_inactive(
        &self,
        objects: &[InactiveObject],
    ) -> Result<ActivationResult, TransportError> {
        let names: Vec<_> = objects.iter().map(|o| o.name.as_str()).collect();
        self.record(format!("activate_inactive {}", names.join(",")));
        Ok(self
            .activations
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(ActivationResult::succeeded))
    }

    fn main_programs(&self, meta_url: &str) -> Result<Vec<MainProgram>, TransportError> {
        self.record(format!("main_programs {meta_url}"));
        Ok(self.main_programs.borrow().clone())
    }

    fn pretty_print(&self, source: &str) -> Result<String, TransportError> {
        Ok(source.to_uppercase())
    }
}

impl Expander for FakeRemote {
    fn expand(&self, object: &ObjectDescriptor) -> Result<Vec<Include>, TransportError> {
        self.record(format!("expand {}", object.name));
        if let Some(err) = self.expand_error.borrow().clone() {
            return Err(err);
        }
        Ok(self.includes.get(&object.name).cloned().unwrap_or_default())
    }
}

/// Formats by upper-casing; idempotent.
impl Formatter for FakeRemote {
    fn format(&self, include: &Include, source: &str) -> Result<String, FormatError> {
        self.record(format!("format {}", include.name));
        Ok(source.to_uppercase())
    }
}

impl Discovery for FakeRemote {
    fn list(
        &self,
        object_type: &str,
        name: &str,
        recursive: bool,
        progress: &mut dyn FnMut(&str),
    ) -> Result<Vec<ObjectDescriptor>, TransportError> {
        self.record(format!("list {object_type} {name} recursive={recursive}"));
        progress(name);
        Ok(self.discovered.borrow().clone())
    }
}

pub fn failed_activation(messages: &[&str]) -> ActivationResult {
    ActivationResult {
        success: false,
        messages: messages
            .iter()
            .map(|m| ActivationMessage {
                severity: "E".to_string(),
                text: m.to_string(),
            })
            .collect(),
        inactive: vec![],
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub objects: RefCell<Vec<String>>,
    pub outcomes: RefCell<Vec<(String, IncludeOutcome)>>,
    pub failure: RefCell<Option<(Option<String>, Option<String>, String)>>,
    pub summaries: RefCell<Vec<SyncStats>>,
}

impl SyncObserver for RecordingObserver {
    fn on_object(&self, object: &ObjectDescriptor) {
        self.objects.borrow_mut().push(object.to_string());
    }

    fn on_include(&self, include: &Include, outcome: IncludeOutcome) {
        self.outcomes
            .borrow_mut()
            .push((include.name.clone(), outcome));
    }

    fn on_failure(
        &self,
        object: Option<&ObjectDescriptor>,
        include: Option<&Include>,
        error: &SyncError,
    ) {
        *self.failure.borrow_mut() = Some((
            object.map(|o| o.name.clone()),
            include.map(|i| i.name.clone()),
            error.to_string(),
        ));
    }

    fn on_summary(&self, stats: &SyncStats) {
        self.summaries.borrow_mut().push(stats.clone());
    }
}
