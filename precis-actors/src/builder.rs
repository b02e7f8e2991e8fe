use crate::actor::{spawn_actor_reserved, Actor, Addr, Reserved};
use crate::system::{ActorSystem, ShutdownHandle};
use anyhow::Result;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;

/// Wires actors by name and owns their tasks until shutdown.
pub struct Builder {
    sys: ActorSystem,
    // Concrete addresses by name for easy wiring.
    addrs: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            sys: ActorSystem::new(),
            addrs: HashMap::new(),
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.sys.shutdown_handle()
    }

    /// Reserve an actor and publish its `Addr` under `name`.
    pub fn reserve<A>(&mut self, name: &str, mailbox: usize) -> Reserved<A>
    where
        A: Actor,
        Addr<A>: Send + Sync + 'static,
    {
        let r = spawn_actor_reserved::<A>(name.to_string(), mailbox);
        self.addrs.insert(name.to_string(), Box::new(r.addr()));
        r
    }

    /// Start a previously reserved actor and track its task.
    pub fn start_reserved<A: Actor>(&mut self, r: Reserved<A>, actor: A) -> &mut Self {
        let shutdown_rx = self.sys.shutdown_notifier();
        let name = r.name().to_string();
        let h = r.start_with_shutdown(actor, Some(shutdown_rx));
        self.sys.track(async move {
            h.task.await??;
            tracing::debug!(actor = %name, "actor.stopped");
            Ok(())
        });
        self
    }

    /// Get a typed address by name.
    pub fn addr<A: Actor>(&self, name: &str) -> Option<Addr<A>>
    where
        Addr<A>: 'static,
    {
        self.addrs
            .get(name)
            .and_then(|b| b.downcast_ref::<Addr<A>>().cloned())
    }

    /// Block until CTRL-C or a shutdown signal, then stop every actor.
    ///
    /// The signal subscription is taken when this is called, not when the
    /// returned future is first polled.
    pub fn run_until_shutdown(mut self) -> impl Future<Output = Result<()>> + Send {
        let mut shutdown_rx = self.sys.shutdown_notifier();
        async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = shutdown_rx.recv() => {}
            }
            // Drop published addresses so actor mailboxes close.
            self.addrs.clear();
            self.sys.graceful_shutdown().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Context;
    use tokio::sync::oneshot;

    struct Echo;

    #[async_trait::async_trait]
    impl Actor for Echo {
        type Msg = (String, oneshot::Sender<String>);

        async fn handle(&mut self, (s, reply): Self::Msg, _ctx: &mut Context<Self>) -> Result<()> {
            let _ = reply.send(s);
            Ok(())
        }
    }

    #[tokio::test]
    async fn addresses_are_published_by_name() {
        let mut b = Builder::new();
        let r = b.reserve::<Echo>("echo", 4);
        b.start_reserved(r, Echo);
        let addr: Addr<Echo> = b.addr("echo").expect("published");
        assert!(b.addr::<Echo>("missing").is_none());

        let (tx, rx) = oneshot::channel();
        addr.send(("hi".into(), tx)).await.ok();
        assert_eq!(rx.await.unwrap(), "hi");

        let handle = b.shutdown_handle();
        let run = tokio::spawn(b.run_until_shutdown());
        drop(addr);
        handle.signal();
        run.await.unwrap().unwrap();
    }
}
