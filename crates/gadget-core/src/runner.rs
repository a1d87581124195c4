//! Isolated execution of route handlers.

use futures::FutureExt;
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Once;
use tokio::task::JoinHandle;
use tracing::{debug, error, info_span, Instrument};
use uuid::Uuid;

/// Contextual fields logged with a task.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    pub name: String,
    pub user: Option<String>,
    pub channel: Option<String>,
}

impl TaskContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }
}

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    /// The handler returned an error.
    Failed(String),
    /// The handler panicked.
    Panicked(String),
}

/// Spawns handlers on their own task behind a panic boundary.
///
/// Faults are logged with the task name, a task id and the context
/// fields, inside the span active at submission (which carries the
/// request id). Panics also log the backtrace captured where they were
/// raised. Faults never propagate to the caller.
#[derive(Debug, Clone, Default)]
pub struct TaskRunner;

impl TaskRunner {
    pub fn new() -> Self {
        Self
    }

    pub fn spawn<F>(&self, context: TaskContext, task: F) -> JoinHandle<TaskOutcome>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        install_backtrace_hook();

        let task_id = Uuid::new_v4();
        let span = info_span!(
            "task",
            task = %context.name,
            task_id = %task_id,
            user = context.user.as_deref().unwrap_or(""),
            channel = context.channel.as_deref().unwrap_or(""),
        );

        tokio::spawn(
            async move {
                match AssertUnwindSafe(task).catch_unwind().await {
                    Ok(Ok(())) => {
                        debug!("Task completed");
                        TaskOutcome::Completed
                    }
                    Ok(Err(e)) => {
                        let message = format!("{:#}", e);
                        error!(error = %message, "Task failed");
                        TaskOutcome::Failed(message)
                    }
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        let backtrace = take_backtrace();
                        error!(panic = %message, backtrace = %backtrace, "Task panicked");
                        TaskOutcome::Panicked(message)
                    }
                }
            }
            .instrument(span),
        )
    }
}

thread_local! {
    static PANIC_BACKTRACE: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static BACKTRACE_HOOK: Once = Once::new();

/// Record a backtrace for every panic on the panicking thread, then defer
/// to the previously installed hook.
fn install_backtrace_hook() {
    BACKTRACE_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            PANIC_BACKTRACE.with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            previous(info);
        }));
    });
}

// catch_unwind runs on the thread that panicked, so the slot is ours.
fn take_backtrace() -> String {
    PANIC_BACKTRACE
        .with(|slot| slot.borrow_mut().take())
        .map(|backtrace| backtrace.to_string())
        .unwrap_or_else(|| "unavailable".to_string())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
