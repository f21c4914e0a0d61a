//! Command dispatch: precedence, fallback, failures, cancellation.

mod common;

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::FutureExt;
use sluice_core::{
    AsyncCommandHandler, BlockingMode, CancellationToken, Command, CommandDispatcher, CommandHandler, Container,
    DispatchError, DispatcherConfig, HandlerError, ResolveError,
};

use common::{count, counter, CountingResolver, UserLocked};

struct CreateUser {
    id: u32,
}

impl Command for CreateUser {}

struct DeleteUser {
    #[allow(dead_code)]
    id: u32,
}

impl Command for DeleteUser {}

struct SyncCreate {
    calls: Arc<AtomicUsize>,
}

impl CommandHandler<CreateUser> for SyncCreate {
    fn handle(&self, command: CreateUser) -> Result<(), HandlerError> {
        if command.id == 0 {
            return Err(Box::new(UserLocked(0)));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct AsyncCreate {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl AsyncCommandHandler<CreateUser> for AsyncCreate {
    async fn handle(&self, command: CreateUser, _cancel: CancellationToken) -> Result<(), HandlerError> {
        tokio::task::yield_now().await;
        if command.id == 0 {
            return Err(Box::new(UserLocked(0)));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn dispatcher(container: &Arc<Container>) -> CommandDispatcher {
    CommandDispatcher::new(container.clone())
}

#[test]
fn sync_only_dispatch_invokes_it() {
    let container = Arc::new(Container::new());
    let calls = counter();
    container.register_command_handler(SyncCreate { calls: calls.clone() });

    dispatcher(&container).dispatch(CreateUser { id: 1 }).unwrap();
    assert_eq!(count(&calls), 1);
}

#[test]
fn sync_only_dispatch_async_returns_completed_future() {
    let container = Arc::new(Container::new());
    let calls = counter();
    container.register_command_handler(SyncCreate { calls: calls.clone() });

    let pending = dispatcher(&container).dispatch_async(CreateUser { id: 1 });
    // The sync handler already ran before the future was polled.
    assert_eq!(count(&calls), 1);
    assert!(matches!(pending.now_or_never(), Some(Ok(()))));
}

#[test]
fn async_only_dispatch_blocks_outside_runtime() {
    let container = Arc::new(Container::new());
    let calls = counter();
    container.register_async_command_handler(AsyncCreate { calls: calls.clone() });

    dispatcher(&container).dispatch(CreateUser { id: 1 }).unwrap();
    assert_eq!(count(&calls), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_only_dispatch_blocks_on_multi_thread_runtime() {
    let container = Arc::new(Container::new());
    let calls = counter();
    container.register_async_command_handler(AsyncCreate { calls: calls.clone() });

    dispatcher(&container).dispatch(CreateUser { id: 1 }).unwrap();
    assert_eq!(count(&calls), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn async_only_dispatch_blocks_on_current_thread_runtime() {
    let container = Arc::new(Container::new());
    let calls = counter();
    container.register_async_command_handler(AsyncCreate { calls: calls.clone() });

    dispatcher(&container).dispatch(CreateUser { id: 1 }).unwrap();
    assert_eq!(count(&calls), 1);
}

#[tokio::test]
async fn async_only_dispatch_async_invokes_it() {
    let container = Arc::new(Container::new());
    let calls = counter();
    container.register_async_command_handler(AsyncCreate { calls: calls.clone() });

    dispatcher(&container).dispatch_async(CreateUser { id: 1 }).await.unwrap();
    assert_eq!(count(&calls), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn both_registered_each_entry_point_uses_its_own_mode() {
    let container = Arc::new(Container::new());
    let sync_calls = counter();
    let async_calls = counter();
    container.register_command_handler(SyncCreate { calls: sync_calls.clone() });
    container.register_async_command_handler(AsyncCreate { calls: async_calls.clone() });
    let commands = dispatcher(&container);

    commands.dispatch(CreateUser { id: 1 }).unwrap();
    assert_eq!((count(&sync_calls), count(&async_calls)), (1, 0));

    commands.dispatch_async(CreateUser { id: 1 }).await.unwrap();
    assert_eq!((count(&sync_calls), count(&async_calls)), (1, 1));
}

#[tokio::test]
async fn neither_registered_is_handler_not_found_on_both_entry_points() {
    let container = Arc::new(Container::new());
    let commands = dispatcher(&container);

    let err = commands.dispatch(DeleteUser { id: 5 }).unwrap_err();
    assert_eq!(err.missing_request().map(|t| t.short_name()), Some("DeleteUser"));
    assert!(err.to_string().contains("DeleteUser"));

    let err = commands.dispatch_async(DeleteUser { id: 5 }).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.missing_request().map(|t| t.short_name()), Some("DeleteUser"));
}

#[test]
fn absent_command_is_rejected_before_any_lookup() {
    let container = Arc::new(Container::new());
    container.register_command_handler(SyncCreate { calls: counter() });
    let resolver = CountingResolver::new(container);
    let commands = CommandDispatcher::new(resolver.clone());

    let err = commands.dispatch(None::<CreateUser>).unwrap_err();
    assert!(matches!(err, DispatchError::InvalidArgument("command")));

    let err = commands.dispatch_async(None::<Box<dyn Command>>).now_or_never().unwrap().unwrap_err();
    assert!(matches!(err, DispatchError::InvalidArgument(_)));

    assert_eq!(resolver.calls(), 0);
}

#[test]
fn sync_handler_failure_surfaces_unchanged() {
    let container = Arc::new(Container::new());
    container.register_command_handler(SyncCreate { calls: counter() });
    let commands = dispatcher(&container);

    let err = commands.dispatch(CreateUser { id: 0 }).unwrap_err();
    assert_eq!(err.handler_error::<UserLocked>(), Some(&UserLocked(0)));
    assert_eq!(err.to_string(), "user 0 is locked");

    let err = commands.dispatch_async(CreateUser { id: 0 }).now_or_never().unwrap().unwrap_err();
    assert_eq!(err.handler_error::<UserLocked>(), Some(&UserLocked(0)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_handler_failure_surfaces_unchanged_on_both_paths() {
    let container = Arc::new(Container::new());
    container.register_async_command_handler(AsyncCreate { calls: counter() });
    let commands = dispatcher(&container);

    let err = commands.dispatch_async(CreateUser { id: 0 }).await.unwrap_err();
    assert_eq!(err.handler_error::<UserLocked>(), Some(&UserLocked(0)));

    let err = commands.dispatch(CreateUser { id: 0 }).unwrap_err();
    let original = err.into_handler_error().unwrap();
    assert_eq!(original.downcast_ref::<UserLocked>(), Some(&UserLocked(0)));
}

#[test]
fn boxed_command_routes_by_runtime_type() {
    let container = Arc::new(Container::new());
    let calls = counter();
    container.register_command_handler(SyncCreate { calls: calls.clone() });
    let commands = dispatcher(&container);

    let batch: Vec<Box<dyn Command>> = vec![Box::new(CreateUser { id: 1 }), Box::new(DeleteUser { id: 2 })];
    let outcomes: Vec<_> = batch.into_iter().map(|c| commands.dispatch(c)).collect();

    assert!(outcomes[0].is_ok());
    assert!(outcomes[1].as_ref().unwrap_err().is_not_found());
    assert_eq!(count(&calls), 1);
}

struct ObserveToken {
    saw_cancelled: Arc<AtomicBool>,
}

#[async_trait]
impl AsyncCommandHandler<CreateUser> for ObserveToken {
    async fn handle(&self, _command: CreateUser, cancel: CancellationToken) -> Result<(), HandlerError> {
        self.saw_cancelled.store(cancel.is_cancelled(), Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn dispatch_async_forwards_the_callers_token() {
    let container = Arc::new(Container::new());
    let saw_cancelled = Arc::new(AtomicBool::new(false));
    container.register_async_command_handler(ObserveToken {
        saw_cancelled: saw_cancelled.clone(),
    });
    let cancel = CancellationToken::new();
    cancel.cancel();

    // The dispatcher itself does not act on the token; the handler decides.
    dispatcher(&container)
        .dispatch_async_cancellable(CreateUser { id: 1 }, cancel)
        .await
        .unwrap();
    assert!(saw_cancelled.load(Ordering::SeqCst));
}

struct Stuck;

#[async_trait]
impl AsyncCommandHandler<CreateUser> for Stuck {
    async fn handle(&self, _command: CreateUser, _cancel: CancellationToken) -> Result<(), HandlerError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

#[test]
fn cancelling_the_blocking_fallback_unblocks_promptly() {
    let container = Arc::new(Container::new());
    container.register_async_command_handler(Stuck);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        trigger.cancel();
    });

    let started = Instant::now();
    let err = dispatcher(&container)
        .dispatch_cancellable(CreateUser { id: 1 }, cancel)
        .unwrap_err();
    canceller.join().unwrap();

    assert!(matches!(err, DispatchError::Cancelled { .. }));
    assert!(started.elapsed() < Duration::from_secs(10));
}

struct Explodes;

#[async_trait]
impl AsyncCommandHandler<CreateUser> for Explodes {
    async fn handle(&self, _command: CreateUser, _cancel: CancellationToken) -> Result<(), HandlerError> {
        panic!("disk on fire");
    }
}

#[test]
fn handler_panic_on_helper_thread_resumes_with_original_payload() {
    let container = Arc::new(Container::new());
    container.register_async_command_handler(Explodes);
    let commands = CommandDispatcher::with_config(
        container,
        DispatcherConfig::default().blocking(BlockingMode::DedicatedThread),
    );

    let payload = panic::catch_unwind(AssertUnwindSafe(|| commands.dispatch(CreateUser { id: 1 }))).unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"disk on fire"));
}

#[test]
fn failing_factory_propagates_as_resolver_error() {
    let container = Arc::new(Container::new());
    container.register_command_handler_factory::<CreateUser, SyncCreate, _>(|_| Err("database unreachable".into()));

    let err = dispatcher(&container).dispatch(CreateUser { id: 1 }).unwrap_err();
    match err {
        DispatchError::Resolver(ResolveError::Provider { source, .. }) => {
            assert_eq!(source.to_string(), "database unreachable");
        }
        other => panic!("expected provider failure, got {other:?}"),
    }
}

#[test]
fn factory_builds_a_handler_per_dispatch() {
    let container = Arc::new(Container::new());
    let calls = counter();
    let built = counter();
    container.register_instance(calls.clone());
    let built_in_factory = built.clone();
    container.register_command_handler_factory::<CreateUser, _, _>(move |c| {
        built_in_factory.fetch_add(1, Ordering::SeqCst);
        Ok(SyncCreate {
            calls: (*c.resolve::<Arc<AtomicUsize>>()?).clone(),
        })
    });
    let commands = dispatcher(&container);

    commands.dispatch(CreateUser { id: 1 }).unwrap();
    commands.dispatch(CreateUser { id: 2 }).unwrap();
    assert_eq!(count(&built), 2);
    assert_eq!(count(&calls), 2);
}
