//! Blocking wait used when `dispatch` falls back to an async handler.

use std::future::Future;
use std::thread;

use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::config::{BlockingMode, DispatcherConfig};
use crate::failure::Fault;

/// Block the calling thread until `future` completes or `cancel` fires.
pub(crate) fn wait<T, F>(future: F, cancel: &CancellationToken, config: &DispatcherConfig) -> Result<T, Fault>
where
    T: Send,
    F: Future<Output = Result<T, Fault>> + Send,
{
    let cancel = cancel.clone();
    let guarded = async move {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Fault::Cancelled),
            outcome = future => outcome,
        }
    };

    match (config.blocking, Handle::try_current()) {
        (BlockingMode::Auto, Ok(handle)) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            trace!("blocking in place on the multi-thread runtime");
            tokio::task::block_in_place(|| handle.block_on(guarded))
        }
        (BlockingMode::Auto, Err(_)) => {
            trace!("no runtime on this thread, driving the handler on a throwaway runtime");
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(Fault::Runtime)?;
            runtime.block_on(guarded)
        }
        _ => {
            trace!(thread = %config.helper_thread_name, "driving the handler on a helper thread");
            on_helper_thread(guarded, &config.helper_thread_name)
        }
    }
}

fn on_helper_thread<T, F>(future: F, name: &str) -> Result<T, Fault>
where
    T: Send,
    F: Future<Output = Result<T, Fault>> + Send,
{
    thread::scope(|scope| {
        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn_scoped(scope, move || {
                let runtime = Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(Fault::Runtime)?;
                runtime.block_on(future)
            })
            .map_err(Fault::Runtime)?;
        // A panicking handler comes back as the join error; keep its payload.
        worker.join().unwrap_or_else(|payload| Err(Fault::Panicked(payload)))
    })
}
