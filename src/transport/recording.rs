//! Transport double recording every send

use super::{InboundHook, Port, Transport, TransportError};
use parking_lot::Mutex;
use std::sync::Arc;

type Hook<T> = Arc<dyn Fn(T) + Send + Sync>;

pub(crate) struct RecordingTransport<T> {
    state: Arc<Mutex<State<T>>>,
}

struct State<T> {
    next_port: u64,
    ports: Vec<(u64, String, Hook<T>)>,
    sent: Vec<(String, T)>,
    opened: usize,
    fail_sends: bool,
}

impl<T: Clone + Send + 'static> RecordingTransport<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                next_port: 0,
                ports: Vec::new(),
                sent: Vec::new(),
                opened: 0,
                fail_sends: false,
            })),
        }
    }

    /// Payloads sent on `name`, in send order
    pub(crate) fn sent(&self, name: &str) -> Vec<T> {
        self.state
            .lock()
            .sent
            .iter()
            .filter(|(channel, _)| channel == name)
            .map(|(_, payload)| payload.clone())
            .collect()
    }

    /// Ports ever opened on any name
    pub(crate) fn opened(&self) -> usize {
        self.state.lock().opened
    }

    /// Ports currently open on `name`
    pub(crate) fn open_ports(&self, name: &str) -> usize {
        self.state
            .lock()
            .ports
            .iter()
            .filter(|(_, channel, _)| channel == name)
            .count()
    }

    pub(crate) fn fail_sends(&self, fail: bool) {
        self.state.lock().fail_sends = fail;
    }

    /// Simulates a message arriving from another context
    pub(crate) fn deliver(&self, name: &str, payload: T) {
        let hooks: Vec<Hook<T>> = self
            .state
            .lock()
            .ports
            .iter()
            .filter(|(_, channel, _)| channel == name)
            .map(|(_, _, hook)| Arc::clone(hook))
            .collect();
        for hook in hooks {
            hook(payload.clone());
        }
    }
}

impl<T> Clone for RecordingTransport<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Clone + Send + 'static> Transport<T> for RecordingTransport<T> {
    fn open(&self, name: &str, on_message: InboundHook<T>) -> Result<Box<dyn Port<T>>, TransportError> {
        let mut state = self.state.lock();
        let id = state.next_port;
        state.next_port += 1;
        state.opened += 1;
        state.ports.push((id, name.to_owned(), Arc::from(on_message)));
        Ok(Box::new(RecordingPort {
            id,
            name: name.to_owned(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct RecordingPort<T> {
    id: u64,
    name: String,
    state: Arc<Mutex<State<T>>>,
}

impl<T: Send> Port<T> for RecordingPort<T> {
    fn post_message(&self, payload: T) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.fail_sends {
            return Err(TransportError::Rejected("injected failure".to_owned()));
        }
        state.sent.push((self.name.clone(), payload));
        Ok(())
    }

    fn close(&self) {
        self.state.lock().ports.retain(|(id, _, _)| *id != self.id);
    }
}
