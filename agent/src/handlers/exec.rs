//! `exec`: spawns `args[0]` with `args[1..]` and `env`, always opening a
//! stdin pipe (closed immediately after writing whatever bytes were given,
//! even zero of them), and streams stdout/stderr as they arrive.

use {
    crate::{error::Result, writer::ReplySink},
    agent_protocol::{ExecChunk, Reply},
    tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        process::Command,
    },
};

const CHUNK: usize = 1024;

pub async fn exec(id: i64, args: &[String], env: &[String], stdin: &[u8], sink: &ReplySink) -> Result<()> {
    let Some((program, rest)) = args.split_first() else {
        sink.send(&Reply::error(id, "exec requires at least one argument", "InvalidInput"));
        return Ok(());
    };

    let mut command = Command::new(program);
    command.args(rest);
    command.env_clear();
    for entry in env {
        if let Some((key, value)) = entry.split_once('=') {
            command.env(key, value);
        }
    }
    command
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(_) => {
            sink.send(&Reply::ExecResult { id, code: -1 });
            return Ok(());
        }
    };

    let stdin_pipe = child.stdin.take();
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    if let Some(mut pipe) = stdin_pipe {
        if !stdin.is_empty() {
            let _ = pipe.write_all(stdin).await;
        }
        // dropping `pipe` here closes the child's stdin unconditionally.
    }

    let sink_stdout = sink.clone();
    let stdout_task = tokio::spawn(async move {
        if let Some(mut pipe) = stdout_pipe {
            stream_pipe(&mut pipe, id, &sink_stdout, |data| ExecChunk::Stdout { stdout: data }).await;
        }
    });

    let sink_stderr = sink.clone();
    let stderr_task = tokio::spawn(async move {
        if let Some(mut pipe) = stderr_pipe {
            stream_pipe(&mut pipe, id, &sink_stderr, |data| ExecChunk::Stderr { stderr: data }).await;
        }
    });

    let wait_result = child.wait().await;
    let _ = tokio::join!(stdout_task, stderr_task);

    let code = match wait_result {
        Ok(status) => status.code().unwrap_or(-1),
        Err(_) => -1,
    };
    sink.send(&Reply::ExecResult { id, code });
    Ok(())
}

async fn stream_pipe<R, F>(pipe: &mut R, id: i64, sink: &ReplySink, to_chunk: F)
where
    R: tokio::io::AsyncRead + Unpin,
    F: Fn(Vec<u8>) -> ExecChunk,
{
    let mut buf = [0u8; CHUNK];
    loop {
        match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => sink.send(&Reply::ExecData {
                id,
                chunk: to_chunk(buf[..n].to_vec()),
            }),
            Err(_) => break,
        }
    }
}
