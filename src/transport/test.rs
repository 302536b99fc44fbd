use super::*;
use std::time::Duration;
use tokio::{
    sync::mpsc::{unbounded_channel, UnboundedReceiver},
    time::timeout,
};

fn hook() -> (InboundHook<String>, UnboundedReceiver<String>) {
    let (tx, rx) = unbounded_channel();
    let hook: InboundHook<String> = Box::new(move |payload| {
        let _ = tx.send(payload);
    });
    (hook, rx)
}

async fn next(rx: &mut UnboundedReceiver<String>) -> String {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("inbound message not delivered")
        .expect("hook dropped")
}

#[tokio::test]
async fn bus_delivers_to_other_ports_only() {
    let bus = BroadcastBus::<String>::new();
    let (hook_a, mut rx_a) = hook();
    let (hook_b, mut rx_b) = hook();
    let a = bus.open("theme", hook_a).unwrap();
    let b = bus.open("theme", hook_b).unwrap();
    assert_eq!(bus.port_count("theme"), 2);

    a.post_message("dark".to_owned()).unwrap();
    assert_eq!(next(&mut rx_b).await, "dark");

    b.post_message("light".to_owned()).unwrap();
    assert_eq!(next(&mut rx_a).await, "light");

    tokio::task::yield_now().await;
    assert!(rx_a.try_recv().is_err());
    assert!(rx_b.try_recv().is_err());

    a.close();
    b.close();
}

#[tokio::test]
async fn bus_delivery_is_not_synchronous() {
    let bus = BroadcastBus::<String>::new();
    let (hook_a, _rx_a) = hook();
    let (hook_b, mut rx_b) = hook();
    let a = bus.open("async", hook_a).unwrap();
    let _b = bus.open("async", hook_b).unwrap();

    a.post_message("x".to_owned()).unwrap();
    assert!(rx_b.try_recv().is_err());
    assert_eq!(next(&mut rx_b).await, "x");
}

#[tokio::test]
async fn bus_keeps_send_order_per_sender() {
    let bus = BroadcastBus::<String>::new();
    let (hook_a, _rx_a) = hook();
    let (hook_b, mut rx_b) = hook();
    let a = bus.open("order", hook_a).unwrap();
    let _b = bus.open("order", hook_b).unwrap();

    for i in 0..10 {
        a.post_message(i.to_string()).unwrap();
    }
    for i in 0..10 {
        assert_eq!(next(&mut rx_b).await, i.to_string());
    }
}

#[tokio::test]
async fn bus_isolates_names() {
    let bus = BroadcastBus::<String>::new();
    let (hook_a, _rx_a) = hook();
    let (hook_b, mut rx_b) = hook();
    let a = bus.open("left", hook_a).unwrap();
    let _b = bus.open("right", hook_b).unwrap();

    a.post_message("lost".to_owned()).unwrap();
    tokio::task::yield_now().await;
    assert!(timeout(Duration::from_millis(50), rx_b.recv()).await.is_err());
}

#[tokio::test]
async fn closed_port_stops_delivery_and_frees_name() {
    let bus = BroadcastBus::<String>::new();
    let (hook_a, _rx_a) = hook();
    let (hook_b, mut rx_b) = hook();
    let a = bus.open("bye", hook_a).unwrap();
    let b = bus.open("bye", hook_b).unwrap();

    b.close();
    b.close();
    assert_eq!(bus.port_count("bye"), 1);
    assert_eq!(b.post_message("late".to_owned()), Err(TransportError::Disconnected));

    a.post_message("unheard".to_owned()).unwrap();
    assert!(timeout(Duration::from_millis(50), rx_b.recv()).await.map_or(true, |m| m.is_none()));

    drop(a);
    assert_eq!(bus.port_count("bye"), 0);
}

#[test]
fn bus_needs_runtime() {
    let bus = BroadcastBus::<String>::new();
    let (hook, _rx) = hook();
    assert_eq!(bus.open("x", hook).err(), Some(TransportError::NoRuntime));
}

#[test]
fn unsupported_refuses_open() {
    let (hook, _rx) = hook();
    let result = Transport::<String>::open(&Unsupported, "x", hook);
    assert_eq!(result.err(), Some(TransportError::Unsupported));
}

#[tokio::test]
async fn bus_burst_reaches_every_peer() {
    let bus = BroadcastBus::<String>::new();
    let (hook_a, mut rx_a) = hook();
    let (hook_b, mut rx_b) = hook();
    let (hook_c, mut rx_c) = hook();
    let a = bus.open("burst", hook_a).unwrap();
    let _b = bus.open("burst", hook_b).unwrap();
    let _c = bus.open("burst", hook_c).unwrap();

    // no await between sends, the pumps only run afterwards
    for i in 0..1000 {
        a.post_message(i.to_string()).unwrap();
    }
    for i in 0..1000 {
        assert_eq!(next(&mut rx_b).await, i.to_string());
        assert_eq!(next(&mut rx_c).await, i.to_string());
    }
    tokio::task::yield_now().await;
    assert!(rx_a.try_recv().is_err());
}
