use {crate::{error::Result, platform}, agent_protocol::{Reply, SignalKind}};

pub fn signal(id: i64, pid: i64, kind: SignalKind) -> Result<Reply> {
    platform::send_signal(pid, kind)?;
    Ok(Reply::SignalSuccess { id })
}
