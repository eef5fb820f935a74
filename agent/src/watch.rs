//! The watch registry, run as a single-owner actor task so the
//! `subscribers`/`refcount` maps never need a lock. The underlying OS watch
//! is driven by the `notify` crate behind that actor loop.

use {
    crate::writer::ReplySink,
    agent_protocol::Reply,
    notify::{Event, RecommendedWatcher, RecursiveMode, Watcher},
    std::{collections::HashMap, path::Path},
    tokio::sync::{mpsc, oneshot},
};

enum Command {
    Watch {
        id: i64,
        path: String,
        reply: oneshot::Sender<Result<(), crate::error::Error>>,
    },
    StopWatch {
        id: i64,
        reply: oneshot::Sender<Result<(), crate::error::Error>>,
    },
}

#[derive(Clone)]
pub struct WatchRegistry {
    tx: mpsc::UnboundedSender<Command>,
}

impl WatchRegistry {
    /// Spawns the actor task and its backing OS watcher, wiring watch
    /// events straight to `sink` as `watchEvent` replies.
    pub fn spawn(sink: ReplySink) -> crate::error::Result<Self> {
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

        let watcher: RecommendedWatcher = notify::recommended_watcher(move |res| match res {
            Ok(event) => {
                let _ = event_tx.send(event);
            }
            Err(err) => tracing::error!(%err, "filesystem watch error"),
        })?;

        tokio::spawn(async move {
            let mut watcher = watcher;
            let mut subscribers: HashMap<i64, String> = HashMap::new();
            let mut refcount: HashMap<String, usize> = HashMap::new();

            loop {
                tokio::select! {
                    cmd = cmd_rx.recv() => {
                        match cmd {
                            None => break,
                            Some(Command::Watch { id, path, reply }) => {
                                let result = watcher
                                    .watch(Path::new(&path), RecursiveMode::Recursive)
                                    .map_err(crate::error::Error::from);
                                if result.is_ok() {
                                    subscribers.insert(id, path.clone());
                                    *refcount.entry(path).or_insert(0) += 1;
                                }
                                let _ = reply.send(result);
                            }
                            Some(Command::StopWatch { id, reply }) => {
                                let result = match subscribers.remove(&id) {
                                    None => Err(crate::error::Err::WatchNotFound.into()),
                                    Some(path) => {
                                        let count = refcount.entry(path.clone()).or_insert(0);
                                        *count = count.saturating_sub(1);
                                        if *count == 0 {
                                            refcount.remove(&path);
                                            watcher
                                                .unwatch(Path::new(&path))
                                                .map_err(crate::error::Error::from)
                                        } else {
                                            Ok(())
                                        }
                                    }
                                };
                                let _ = reply.send(result);
                            }
                        }
                    }
                    event = event_rx.recv() => {
                        let Some(event) = event else { break };
                        for path in event.paths.iter().filter_map(|p| p.to_str()) {
                            for (&id, watched) in subscribers.iter() {
                                if path.starts_with(watched.as_str()) {
                                    sink.send(&Reply::WatchEvent {
                                        id,
                                        path: path.to_string(),
                                        event_type: event_kind_code(&event.kind),
                                    });
                                }
                            }
                        }
                    }
                }
            }
        });

        Ok(Self { tx: cmd_tx })
    }

    pub async fn watch(&self, id: i64, path: String) -> crate::error::Result<()> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::Watch { id, path, reply });
        rx.await.unwrap_or(Err(crate::error::Err::Generic(
            "watch registry shut down".into(),
        )
        .into()))
    }

    pub async fn stop_watch(&self, id: i64) -> crate::error::Result<()> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::StopWatch { id, reply });
        rx.await.unwrap_or(Err(crate::error::Err::Generic(
            "watch registry shut down".into(),
        )
        .into()))
    }
}

/// Collapses `notify`'s `EventKind` to a small integer so the wire
/// `eventType` field stays a plain int.
fn event_kind_code(kind: &notify::EventKind) -> i32 {
    use notify::EventKind::*;
    match kind {
        Create(_) => 1,
        Modify(_) => 2,
        Remove(_) => 4,
        Access(_) => 8,
        Other | Any => 0,
    }
}
