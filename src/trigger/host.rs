// Host edge sources standing in for the trigger button

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::TriggerSource;

/// Spawn the host edge sources: a line on stdin, and `SIGUSR1` on unix.
///
/// Each source only calls [`TriggerSource::on_edge`].
pub fn spawn_edge_sources(trigger: Arc<TriggerSource>) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();

    let stdin_trigger = Arc::clone(&trigger);
    handles.push(tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(_)) => {
                    stdin_trigger.on_edge();
                }
                Ok(None) => {
                    info!("stdin closed, keyboard trigger disabled");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    }));

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::user_defined1()) {
            Ok(mut sigusr1) => {
                info!(
                    "Press Enter or send SIGUSR1 to pid {} to record",
                    std::process::id()
                );
                handles.push(tokio::spawn(async move {
                    while sigusr1.recv().await.is_some() {
                        trigger.on_edge();
                    }
                }));
            }
            Err(e) => warn!("Failed to install SIGUSR1 handler: {}", e),
        }
    }

    #[cfg(not(unix))]
    {
        drop(trigger);
        info!("Press Enter to record");
    }

    handles
}
