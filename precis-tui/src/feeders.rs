use crate::tui::{TuiActor, TuiMsg};
use precis_actors::actor::Addr;
use precis_actors::system::ShutdownHandle;
use std::time::Duration;
use tokio::time;

const INPUT_POLL: Duration = Duration::from_millis(100);

/// Feed terminal input and redraw ticks into the popup until shutdown.
pub fn spawn_tui_feeders(tui: Addr<TuiActor>, shutdown: ShutdownHandle) {
    let tui_in = tui.clone();
    let mut shutdown_input = shutdown.subscribe();
    tokio::spawn(async move {
        loop {
            // Poll with a timeout so the blocking read never outlives shutdown.
            let next = tokio::task::spawn_blocking(|| -> std::io::Result<Option<crossterm::event::Event>> {
                if crossterm::event::poll(INPUT_POLL)? {
                    crossterm::event::read().map(Some)
                } else {
                    Ok(None)
                }
            });
            tokio::select! {
                _ = shutdown_input.recv() => break,
                ev = next => {
                    match ev {
                        Ok(Ok(Some(e))) => {
                            if tui_in.send(TuiMsg::InputEvent(e)).await.is_err() {
                                break;
                            }
                        }
                        Ok(Ok(None)) => {}
                        Ok(Err(e)) => {
                            let _ = tui_in.send(TuiMsg::OpError(format!("input: {e}"))).await;
                        }
                        Err(_) => break,
                    }
                }
            }
        }
        tracing::debug!("tui.feeder.input.stopped");
    });

    let tui_tick = tui;
    let mut shutdown_tick = shutdown.subscribe();
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_millis(80));
        loop {
            tokio::select! {
                _ = shutdown_tick.recv() => break,
                _ = interval.tick() => {
                    if tui_tick.is_closed() {
                        break;
                    }
                    let _ = tui_tick.try_send(TuiMsg::Tick);
                }
            }
        }
    });
}
