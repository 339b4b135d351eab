use std::{future::Future, sync::Arc, time::Duration};

use tokio::{net::TcpListener, sync::broadcast, task::JoinSet};

use crate::{broker::Broker, session};

/// Pause after a failed accept, errors such as running out of file descriptors persist for a while
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept connections until `shutdown` resolves, running one task per connection
///
/// There is no limit on the number of connections. Once shutdown is requested the
/// listener stops accepting, asks every session to close and waits for them.
pub async fn run(
    listener: TcpListener,
    broker: Arc<Broker>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let mut join_set: JoinSet<anyhow::Result<()>> = JoinSet::new();
    let (quit_tx, quit_rx) = broadcast::channel::<()>(1);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("server interrupted, gracefully shutting down");
                // no receivers left only means no session is running
                let _ = quit_tx.send(());
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((socket, _)) => {
                    join_set.spawn(session::handle_user_session(broker.clone(), quit_rx.resubscribe(), socket));
                }
                Err(err) => {
                    tracing::warn!(%err, "could not accept connection");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
            // reap finished sessions so the join set does not grow with every connection ever made
            Some(finished) = join_set.join_next() => match finished {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::debug!("session ended with error: {:#}", err),
                Err(err) => tracing::error!(%err, "session task failed"),
            },
        }
    }

    while join_set.join_next().await.is_some() {}
    tracing::info!("server shut down");

    Ok(())
}
