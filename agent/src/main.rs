mod cli;
mod dispatcher;
mod error;
mod handlers;
mod platform;
mod watch;
mod writer;

use {
    agent_protocol::Request,
    clap::Parser,
    cli::Cli,
    dispatcher::Dispatcher,
    tokio::io::{AsyncWriteExt, BufWriter},
    watch::WatchRegistry,
    writer::ReplySink,
};

fn init_tracing(test_mode: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    // stderr carries the binary frame stream outside `--test` mode, so
    // ordinary logging must not share it.
    if test_mode {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::sink)
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.test);

    if cli.write {
        return write_sample_requests().await;
    }

    if cli.test {
        return run_test_mode().await;
    }

    let sink = ReplySink::spawn(BufWriter::new(tokio::io::stderr()));
    let watches = match WatchRegistry::spawn(sink.clone()) {
        Ok(w) => w,
        Err(err) => {
            tracing::error!(%err, "failed to start filesystem watcher");
            std::process::exit(1);
        }
    };

    let dispatcher = Dispatcher::new(sink.clone(), watches);
    dispatcher.send_environment();
    dispatcher.run(tokio::io::stdin()).await;
    sink.close();
}

/// Encodes a small, fixed request batch to stdout — a fixture generator
/// for `--test`, reproducing `writeMain`'s role.
async fn write_sample_requests() {
    let requests = sample_requests();
    let mut out = Vec::new();
    for request in &requests {
        out.extend(serde_cbor::to_vec(request).expect("sample requests always encode"));
    }
    let mut stdout = tokio::io::stdout();
    let _ = stdout.write_all(&out).await;
    let _ = stdout.flush().await;
}

/// Runs the sample request batch in-process and pretty-prints each reply
/// to stderr as a human-readable JSON line.
async fn run_test_mode() {
    let sink = ReplySink::spawn_pretty();
    let watches = match WatchRegistry::spawn(sink.clone()) {
        Ok(w) => w,
        Err(err) => {
            eprintln!("failed to start filesystem watcher: {err}");
            return;
        }
    };

    let dispatcher = Dispatcher::new(sink.clone(), watches);
    dispatcher.send_environment();

    let mut encoded = Vec::new();
    for request in sample_requests() {
        encoded.extend(serde_cbor::to_vec(&request).expect("sample requests always encode"));
    }

    let (mut feed, intake) = tokio::io::duplex(encoded.len().max(1024));
    let feeder = tokio::spawn(async move {
        let _ = feed.write_all(&encoded).await;
    });
    dispatcher.run(intake).await;
    let _ = feeder.await;
    sink.close();
}

fn sample_requests() -> Vec<Request> {
    vec![
        Request::Stat {
            id: 1,
            path: "/tmp".into(),
        },
        Request::ReadFile {
            id: 2,
            path: "/tmp/does-not-exist".into(),
            offset: 0,
            limit: -1,
        },
    ]
}
