//! Application-wide constants
//!
//! Centralized location for magic strings and configuration values
//! that are used across multiple modules.

use std::time::Duration;

/// Local replica gateway
pub const LOCAL_HOST: &str = "http://127.0.0.1:4943";

/// Mainnet gateway
pub const MAINNET_HOST: &str = "https://ic0.app";

/// Backend canister id on a local replica (from the deploy output)
pub const LOCAL_CANISTER_ID: &str = "uxrrr-q7777-77774-qaaaq-cai";

/// Backend canister id on mainnet
pub const MAINNET_CANISTER_ID: &str = "mbaar-paaaa-aaaam-aeyma-cai";

/// Text form of the anonymous principal
pub const ANONYMOUS_IDENTITY: &str = "2vxsx-fae";

// Room bootstrap - created when the directory comes back empty
pub const DEFAULT_ROOM_NAME: &str = "Global Chat";
pub const DEFAULT_ROOM_DESCRIPTION: &str = "Everyone's trading floor.";

/// How often the active room is re-fetched
pub const POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Number of messages fetched per poll (no pagination cursor)
pub const MESSAGE_WINDOW: u32 = 50;

/// Server-side cap on `list_messages` limits
pub const MAX_MESSAGE_WINDOW: u32 = 200;

/// Timeout applied to every remote call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// Identity label truncation: "abcde…xyz"
pub const LABEL_MAX_LEN: usize = 10;
pub const LABEL_HEAD: usize = 5;
pub const LABEL_TAIL: usize = 3;

/// Remote timestamps are nanoseconds; display works in milliseconds
pub const NANOS_PER_MILLI: u64 = 1_000_000;

/// Tips are accumulated in e8s (1e-8 of a whole token)
pub const E8S_PER_TOKEN: u64 = 100_000_000;

/// Ticker for tip totals
pub const TOKEN_SYMBOL: &str = "ICP";
