//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements     | Connects to              |
//! |----------------|----------------|--------------------------|
//! | `gateway_link` | EvseStatusPort | EVSE serial link / WiFi  |
//! | `log_sink`     | EventSink      | Serial log output        |
//! | `nvs`          | ConfigPort     | NVS / in-memory store    |
//! | `time`         | —              | ESP32 system timer       |

pub mod gateway_link;
pub mod log_sink;
pub mod nvs;
pub mod time;
