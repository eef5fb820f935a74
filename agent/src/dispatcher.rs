//! Reads decoded requests off stdin and spawns one task per request.
//! Blocking filesystem calls run on `spawn_blocking` so one slow
//! `find`/`readfile` cannot stall the tokio worker pool.

use {
    crate::{
        error::wire_parts,
        handlers,
        watch::WatchRegistry,
        writer::{Batcher, ReplySink},
    },
    agent_protocol::{codec, Reply, Request},
    std::sync::atomic::{AtomicUsize, Ordering},
    std::sync::Arc,
    tokio::io::AsyncRead,
    tracing_futures::Instrument,
};

pub struct Dispatcher {
    sink: ReplySink,
    watches: WatchRegistry,
    inflight: Arc<AtomicUsize>,
}

impl Dispatcher {
    pub fn new(sink: ReplySink, watches: WatchRegistry) -> Self {
        Self {
            sink,
            watches,
            inflight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sends the bootstrap `environment` reply (id `-1`), matching
    /// `sendEnvironment`'s placement before any command is read.
    pub fn send_environment(&self) {
        self.sink.send(&Reply::Environment {
            id: -1,
            os_type: std::env::consts::OS.to_string(),
            env: std::env::vars().map(|(k, v)| format!("{k}={v}")).collect(),
        });
    }

    /// Drains `reader` until EOF, spawning one task per decoded request,
    /// then waits for all in-flight handlers to finish before returning.
    pub async fn run<R>(&self, mut reader: R)
    where
        R: AsyncRead + Unpin,
    {
        let mut decoder = codec::RequestDecoder::new();
        let mut last_id = -1;

        loop {
            match codec::read_next_request(&mut reader, &mut decoder).await {
                Ok(None) => break,
                Ok(Some(Ok(Request::Exit { .. }))) => {
                    // Tears down immediately, without waiting on in-flight work.
                    std::process::exit(0);
                }
                Ok(Some(Ok(request))) => {
                    last_id = request.id();
                    self.dispatch(request);
                }
                Ok(Some(Err(err))) => {
                    tracing::warn!(%err, "malformed request frame");
                    self.dispatch(Request::Error {
                        id: last_id,
                        error: err.to_string(),
                    });
                }
                Err(err) => {
                    tracing::error!(%err, "stdin read failed");
                    break;
                }
            }
        }

        while self.inflight.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    fn dispatch(&self, request: Request) {
        self.inflight.fetch_add(1, Ordering::SeqCst);
        let sink = self.sink.clone();
        let watches = self.watches.clone();
        let inflight = self.inflight.clone();
        let span = tracing::info_span!("handle_request", id = request.id());

        tokio::spawn(
            async move {
                handle(request, &sink, &watches).await;
                inflight.fetch_sub(1, Ordering::SeqCst);
            }
            .instrument(span),
        );
    }
}

async fn handle(request: Request, sink: &ReplySink, watches: &WatchRegistry) {
    let id = request.id();

    let reply = match request {
        Request::Stat { id, path } => blocking(move || handlers::stat::stat(id, &path)).await,
        Request::Is { id, path, check } => blocking(move || handlers::is::is(id, &path, check)).await,
        Request::Find {
            id,
            directory,
            name_filters,
            file_filters,
            iterator_flags,
        } => {
            let sink = sink.clone();
            blocking_unit(move || {
                let mut batcher = Batcher::new(&sink);
                handlers::find::find(
                    id,
                    &directory,
                    &name_filters,
                    file_filters,
                    iterator_flags,
                    &mut batcher,
                )
            })
            .await
        }
        Request::ReadFile {
            id,
            path,
            offset,
            limit,
        } => {
            let sink = sink.clone();
            blocking_unit(move || {
                let mut batcher = Batcher::new(&sink);
                handlers::readfile::read_file(id, &path, offset, limit, &mut batcher)
            })
            .await
        }
        Request::WriteFile { id, path, contents } => {
            blocking(move || handlers::writefile::write_file(id, &path, &contents)).await
        }
        Request::CopyFile { id, source, target } => {
            blocking(move || handlers::fileops::copy_file(id, &source, &target)).await
        }
        Request::RenameFile { id, source, target } => {
            blocking(move || handlers::fileops::rename_file(id, &source, &target)).await
        }
        Request::SetPermissions { id, path, mode } => {
            blocking(move || handlers::fileops::set_permissions(id, &path, mode)).await
        }
        Request::Remove { id, path } => blocking(move || handlers::fileops::remove(id, &path)).await,
        Request::RemoveAll { id, path } => {
            blocking(move || handlers::fileops::remove_all(id, &path)).await
        }
        Request::EnsureExistingFile { id, path } => {
            blocking(move || handlers::fileops::ensure_existing_file(id, &path)).await
        }
        Request::CreateDir { id, path } => {
            blocking(move || handlers::fileops::create_dir(id, &path)).await
        }
        Request::CreateTempFile { id, path } => {
            blocking(move || handlers::fileops::create_temp_file(id, &path)).await
        }
        Request::ReadLink { id, path } => {
            blocking(move || handlers::fileops::read_link(id, &path)).await
        }
        Request::FileId { id, path } => blocking(move || handlers::fileops::file_id(id, &path)).await,
        Request::FreeSpace { id, path } => {
            blocking(move || handlers::fileops::free_space(id, &path)).await
        }
        Request::Exec { id, args, env, stdin } => {
            match handlers::exec::exec(id, &args, &env, &stdin, sink).await {
                Ok(()) => return,
                Err(err) => Err(err),
            }
        }
        Request::Signal { id, pid, signal } => {
            blocking(move || handlers::signal::signal(id, pid, signal)).await
        }
        Request::Watch { id, path } => match watches.watch(id, path).await {
            Ok(()) => Ok(Some(Reply::AddWatchResult { id, result: true })),
            Err(err) => Err(err),
        },
        Request::StopWatch { id } => match watches.stop_watch(id).await {
            Ok(()) => Ok(Some(Reply::RemoveWatchResult { id, result: true })),
            Err(err) => Err(err),
        },
        Request::Exit { .. } => unreachable!("handled before dispatch"),
        Request::Error { id, error } => {
            sink.send(&Reply::Error {
                id,
                error,
                error_type: String::new(),
            });
            return;
        }
    };

    match reply {
        Ok(Some(reply)) => sink.send(&reply),
        Ok(None) => {}
        Err(err) => {
            let (message, error_type) = wire_parts(&err);
            sink.send(&Reply::error(id, message, error_type));
        }
    }
}

/// Runs `f` on a blocking-pool thread and folds its `Result<Reply>` into
/// the `Result<Option<Reply>>` shape `handle` expects.
async fn blocking<F>(f: F) -> crate::error::Result<Option<Reply>>
where
    F: FnOnce() -> crate::error::Result<Reply> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map(Some),
        Err(_) => Ok(None),
    }
}

/// Like [`blocking`], but for handlers that stream their own replies
/// through a [`Batcher`] and only need their error folded back in.
async fn blocking_unit<F>(f: F) -> crate::error::Result<Option<Reply>>
where
    F: FnOnce() -> crate::error::Result<()> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map(|_| None),
        Err(_) => Ok(None),
    }
}
