use intersync::{transport::BroadcastBus, BindOptions, Binding, Registry};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

intersync::declare! {
    /// Counter shared by both contexts
    channel[throttle = 50] Clicks(u32) = "clicks";
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("intersync=debug")))
        .init();

    // registries are typed by payload, one bus per payload type
    let themes = BroadcastBus::new();
    let tab_a = Registry::new(themes.clone());
    let tab_b = Registry::new(themes.clone());

    let theme_a = Binding::bind(
        &tab_a,
        "theme",
        "light".to_owned(),
        BindOptions::new().on_change(|value: &String, from_remote| {
            println!("tab A: theme = {} (remote: {})", value, from_remote);
        }),
    )
    .expect("Cannot bind theme in tab A");
    let theme_b = Binding::bind(
        &tab_b,
        "theme",
        "light".to_owned(),
        BindOptions::new().on_change(|value: &String, from_remote| {
            println!("tab B: theme = {} (remote: {})", value, from_remote);
        }),
    )
    .expect("Cannot bind theme in tab B");

    theme_a.set("dark".to_owned()).expect("Cannot set theme");
    tokio::time::sleep(Duration::from_millis(10)).await;
    println!("tab B sees theme = {}", theme_b.value());

    let counters = BroadcastBus::new();
    let counters_a = Registry::new(counters.clone());
    let counters_b = Registry::new(counters.clone());
    let clicks_a = Clicks::acquire(&counters_a).expect("Cannot acquire clicks in tab A");
    let clicks_b = Clicks::acquire(&counters_b).expect("Cannot acquire clicks in tab B");
    clicks_b.add_listener(intersync::Listener::new(|count: &u32, from_remote| {
        println!("tab B: clicks = {} (remote: {})", count, from_remote);
    }));
    // only the first of a rapid burst crosses to tab B
    for count in 1..=5 {
        clicks_a.post(count).expect("Cannot post clicks");
    }
    tokio::time::sleep(Duration::from_millis(10)).await;

    theme_a.unbind();
    theme_b.unbind();
    counters_a.close_all();
    counters_b.close_all();
    assert!(tab_a.is_empty() && tab_b.is_empty());
}
