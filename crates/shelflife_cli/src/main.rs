//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `shelflife_core` wiring.
//! - Print the selected backend, the expiring set and pending reminders.

use chrono::Utc;
use log::info;
use shelflife_core::{BackendSelector, CoreConfig, CoreRuntime};

fn main() {
    let config = CoreConfig::from_env();
    let log_dir = config.log_dir();
    if let Err(err) = shelflife_core::init_logging(&config.log_level, &log_dir.to_string_lossy()) {
        eprintln!("logging disabled: {err}");
    }

    println!("shelflife_core ping={}", shelflife_core::ping());
    println!("shelflife_core version={}", shelflife_core::core_version());

    let selector = BackendSelector::from_config(&config);
    let runtime = CoreRuntime::start(&selector);
    let maintenance = runtime.startup_maintenance();
    println!(
        "backend={} expired_flags_updated={} maintenance_ok={}",
        runtime.backend().as_str(),
        maintenance.updated,
        maintenance.ok
    );

    let expiring = runtime.repository().get_expiring(config.lead_window_days);
    println!(
        "expiring_within_days={} count={}",
        config.lead_window_days,
        expiring.len()
    );
    for item in &expiring {
        println!(
            "  #{} {} [{}] expires={} qty={}",
            item.id,
            item.name,
            item.category.label(),
            item.expiry_date,
            item.quantity
        );
    }

    let now = Utc::now();
    for trigger in runtime.reminders().compute_triggers(config.lead_window_days) {
        println!(
            "  reminder item={} at={} past={} title={:?}",
            trigger.item.id,
            trigger.trigger_at.to_rfc3339(),
            trigger.is_past(now),
            trigger.title
        );
    }

    info!(
        "event=cli_probe module=cli status=ok backend={} expiring={}",
        runtime.backend().as_str(),
        expiring.len()
    );
}
