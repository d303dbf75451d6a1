//! Sync orchestration.
//!
//! For every object: expand into includes, then per include
//! read → format → compare → lock → write → unlock → activate. The remote
//! session is stateful for the whole run and is torn down exactly once at
//! the end, whether the run succeeded or not.

use prettysync_core::{Expander, Include, ObjectDescriptor, SessionType, SyncOptions, Transport};
use prettysync_format::Formatter;

use crate::error::SyncError;
use crate::guard::{try_lock, LockOutcome};
use crate::status::{IncludeOutcome, NoopObserver, RunStatus, SyncObserver, SyncStats};
use crate::writer::write_include;

/// Drives one or more sync runs against a single remote session.
pub struct SourceSync<'a> {
    transport: &'a dyn Transport,
    expander: &'a dyn Expander,
    formatter: &'a dyn Formatter,
    observer: &'a dyn SyncObserver,
}

impl<'a> SourceSync<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        expander: &'a dyn Expander,
        formatter: &'a dyn Formatter,
    ) -> Self {
        Self {
            transport,
            expander,
            formatter,
            observer: &NoopObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn SyncObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Process `objects` in order, stopping at the first fatal error.
    ///
    /// The error returned is the one the failing step raised, unwrapped. The
    /// object and include in flight are reported to the observer and the log
    /// before the session is torn down.
    pub fn process_objects(
        &self,
        objects: &[ObjectDescriptor],
        options: &SyncOptions,
    ) -> Result<SyncStats, SyncError> {
        let mut run = RunStatus::new();

        let result = self
            .transport
            .set_session_type(SessionType::Stateful)
            .map_err(SyncError::from)
            .and_then(|()| self.process_all(objects, options, &mut run));

        if let Err(err) = &result {
            self.report_failure(&run, err);
        }

        let teardown = self.teardown();

        run.stats.finish();
        tracing::info!("{}", run.stats.summary());
        self.observer.on_summary(&run.stats);

        result?;
        teardown?;
        Ok(run.stats)
    }

    fn process_all(
        &self,
        objects: &[ObjectDescriptor],
        options: &SyncOptions,
        run: &mut RunStatus,
    ) -> Result<(), SyncError> {
        for object in objects {
            run.current_object = Some(object.clone());
            tracing::debug!("processing {object}");
            self.observer.on_object(object);

            let includes = self.expander.expand(object)?;
            for include in &includes {
                self.process_include(include, options, run)?;
            }
            run.stats.processed_objects += 1;
        }
        Ok(())
    }

    fn process_include(
        &self,
        include: &Include,
        options: &SyncOptions,
        run: &mut RunStatus,
    ) -> Result<IncludeOutcome, SyncError> {
        run.current_include = Some(include.clone());

        let source = self.transport.get_object_source(&include.source_url)?;
        let formatted = self.formatter.format(include, &source)?;

        let outcome = if formatted == source {
            IncludeOutcome::Unchanged
        } else {
            match try_lock(self.transport, &include.meta_url)? {
                LockOutcome::NotLockable => IncludeOutcome::Generated,
                LockOutcome::Locked(lock) => write_include(
                    self.transport,
                    include,
                    &formatted,
                    &lock,
                    options,
                    &mut run.stats,
                )?,
            }
        };

        tracing::debug!("{include}: {}", outcome.label());
        run.stats.processed_includes += 1;
        run.current_include = None;
        self.observer.on_include(include, outcome);
        Ok(outcome)
    }

    fn report_failure(&self, run: &RunStatus, err: &SyncError) {
        match (&run.current_object, &run.current_include) {
            (Some(object), Some(include)) => {
                tracing::error!("failed on object {object}, include {include}: {err}")
            }
            (Some(object), None) => tracing::error!("failed on object {object}: {err}"),
            _ => tracing::error!("failed before processing any object: {err}"),
        }
        self.observer
            .on_failure(run.current_object.as_ref(), run.current_include.as_ref(), err);
    }

    fn teardown(&self) -> Result<(), SyncError> {
        let stateless = self.transport.set_session_type(SessionType::Stateless);
        if let Err(err) = &stateless {
            tracing::warn!("failed to switch session back to stateless: {err}");
        }
        let dropped = self.transport.drop_session();
        if let Err(err) = &dropped {
            tracing::warn!("failed to drop session: {err}");
        }
        stateless?;
        dropped?;
        Ok(())
    }
}
