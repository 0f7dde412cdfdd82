//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                 | Connects to                 |
//! |-------------|----------------------------|-----------------------------|
//! | `hardware`  | ThrottlePort, MotorPort    | Pedal GPIOs, LEDC motor PWM |
//! |             | IndicatorPort              | Status LED GPIO             |
//! | `nvs`       | StoragePort                | NVS / in-memory store       |
//! | `time`      | ClockPort                  | ESP32 high-resolution timer |
//! | `ws_server` | ListenerTransport          | ESP-IDF HTTP server, ws     |
//! | `wifi`      | (bring-up only)            | ESP-IDF WiFi soft-AP        |

pub mod hardware;
pub mod nvs;
pub mod time;
pub mod wifi;
#[cfg(target_os = "espidf")]
pub mod ws_server;
