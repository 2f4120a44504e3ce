//! Offline mode: an in-memory ledger seeded with a couple of rooms.

use std::sync::Arc;

use bullchat_core::session::StaticIdentityProvider;
use bullchat_core::{CoreConfig, Identity, MemoryChatService, Message, Session};

const DEMO_USER: &str = "demo-trader";
const WHALE: &str = "rdmx6-jaaaa-aaaaa-aaadq-cai";
const DEGEN: &str = "qoctq-giaaa-aaaaa-aaaea-cai";

/// Seconds-ago offsets are turned into nanosecond timestamps around `now`.
fn seed(service: &MemoryChatService, now: u64) {
    let global = service.seed_room("Global Chat", "Everyone's trading floor.", false);
    let traders = service.seed_room("Traders", "Charts and calls", false);
    // duplicate name from another client; collapsed on display
    service.seed_room("Global Chat", "Everyone's trading floor.", false);

    let ago = |secs: u64| now.saturating_sub(secs * 1_000_000_000);
    let rows = [
        (1, global.id, WHALE, 300, "gm. BTC looking strong into the weekly close", None, 150_000_000),
        (2, global.id, DEGEN, 240, "leverage up or stay poor", Some(1), 0),
        (3, global.id, DEMO_USER, 180, "taking profit at the range high", Some(1), 0),
        (4, traders.id, WHALE, 120, "ICP reclaiming the 200d", None, 0),
        (5, traders.id, DEGEN, 60, "invalidation below the last swing low", Some(4), 0),
    ];
    for (id, room_id, author, secs, content, reply_to, tips) in rows {
        service.seed_message(Message {
            id,
            room_id,
            author: Identity::new(author),
            content: content.to_string(),
            timestamp: ago(secs),
            reply_to,
            edited: false,
            tip_total: tips,
        });
    }
}

pub fn demo_session(config: CoreConfig) -> Session {
    let identity = config
        .identity
        .clone()
        .unwrap_or_else(|| Identity::new(DEMO_USER));
    let service = MemoryChatService::new(identity.clone());
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    seed(&service, now);

    Session::new(
        config,
        Arc::new(StaticIdentityProvider::new(identity)),
        Arc::new(service),
    )
}
