use super::{InboundHook, Port, Transport, TransportError};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};
use tokio::{
    runtime::Handle,
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{trace, Instrument};

/// In-process broadcast transport
///
/// Every clone of a bus shares the same set of names, so registries
/// built on clones of one bus see each other's messages. Each port owns
/// an unbounded inbox: a successful send reaches every other port open
/// on the name, in send order. Inbound messages are delivered by a
/// per-port task on the tokio runtime that opened the port, never inside
/// the posting call.
pub struct BroadcastBus<T> {
    inner: Arc<BusInner<T>>,
}

struct BusInner<T> {
    next_port: AtomicU64,
    topics: Mutex<HashMap<String, Vec<Inbox<T>>>>,
}

struct Inbox<T> {
    port: u64,
    sender: UnboundedSender<T>,
}

impl<T: Clone + Send + Sync + 'static> BroadcastBus<T> {
    /// Creates a bus with no open ports
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                next_port: AtomicU64::new(0),
                topics: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Number of ports currently open on `name`
    pub fn port_count(&self, name: &str) -> usize {
        self.inner.topics.lock().get(name).map_or(0, Vec::len)
    }
}

impl<T: Clone + Send + Sync + 'static> Default for BroadcastBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BroadcastBus<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Transport<T> for BroadcastBus<T> {
    fn open(&self, name: &str, on_message: InboundHook<T>) -> Result<Box<dyn Port<T>>, TransportError> {
        let runtime = Handle::try_current().map_err(|_| TransportError::NoRuntime)?;
        let id = self.inner.next_port.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let pump = runtime.spawn(pump(receiver, Arc::clone(&closed), on_message).in_current_span());
        self.inner
            .topics
            .lock()
            .entry(name.to_owned())
            .or_default()
            .push(Inbox { port: id, sender });
        trace!(channel = %name, port = id, "bus port opened");
        Ok(Box::new(BusPort {
            id,
            name: name.to_owned(),
            closed,
            pump: Mutex::new(Some(pump)),
            bus: Arc::clone(&self.inner),
        }))
    }
}

async fn pump<T>(mut receiver: UnboundedReceiver<T>, closed: Arc<AtomicBool>, on_message: InboundHook<T>) {
    while let Some(payload) = receiver.recv().await {
        if closed.load(Ordering::Acquire) {
            return;
        }
        on_message(payload);
    }
}

struct BusPort<T> {
    id: u64,
    name: String,
    closed: Arc<AtomicBool>,
    pump: Mutex<Option<JoinHandle<()>>>,
    bus: Arc<BusInner<T>>,
}

impl<T: Clone + Send + Sync + 'static> Port<T> for BusPort<T> {
    fn post_message(&self, payload: T) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Disconnected);
        }
        let topics = self.bus.topics.lock();
        let peers = topics
            .get(&self.name)
            .into_iter()
            .flatten()
            .filter(|inbox| inbox.port != self.id);
        for inbox in peers {
            // a peer whose pump already stopped is closing, nothing to deliver
            let _ = inbox.sender.send(payload.clone());
        }
        Ok(())
    }

    fn close(&self) {
        if self.release() {
            trace!(channel = %self.name, port = self.id, "bus port closed");
        }
    }
}

impl<T> BusPort<T> {
    fn release(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
        let mut topics = self.bus.topics.lock();
        if let Some(inboxes) = topics.get_mut(&self.name) {
            inboxes.retain(|inbox| inbox.port != self.id);
            if inboxes.is_empty() {
                topics.remove(&self.name);
            }
        }
        true
    }
}

impl<T> Drop for BusPort<T> {
    fn drop(&mut self) {
        self.release();
    }
}
