//! WiFi soft-AP adapter.
//!
//! The controller hosts its own open network; the phone or tablet running
//! the remote UI joins it and opens the websocket.  Bring-up happens once
//! from `main` and is otherwise invisible to the control core.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi` in access-point mode.
//! - **all other targets**: simulation stub for host-side tests.

use core::fmt;
use log::info;

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApError {
    InvalidSsid,
    InvalidChannel,
    StartFailed,
}

impl fmt::Display for ApError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidChannel => write!(f, "channel must be 1-13"),
            Self::StartFailed => write!(f, "soft-AP start failed"),
        }
    }
}

impl std::error::Error for ApError {}

// ───────────────────────────────────────────────────────────────
// Configuration
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SoftApConfig {
    pub ssid: heapless::String<32>,
    pub channel: u8,
    /// Stations allowed at once; matches the listener table size.
    pub max_connections: u16,
}

impl SoftApConfig {
    pub fn new(ssid: &str, channel: u8, max_connections: u16) -> Result<Self, ApError> {
        validate_ssid(ssid)?;
        if !(1..=13).contains(&channel) {
            return Err(ApError::InvalidChannel);
        }
        let mut s = heapless::String::new();
        s.push_str(ssid).map_err(|()| ApError::InvalidSsid)?;
        Ok(Self {
            ssid: s,
            channel,
            max_connections,
        })
    }
}

fn validate_ssid(ssid: &str) -> Result<(), ApError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(ApError::InvalidSsid);
    }
    if !ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
        return Err(ApError::InvalidSsid);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Bring-up
// ───────────────────────────────────────────────────────────────

/// Running access point.  Dropping it stops the radio.
pub struct SoftAp {
    #[cfg(target_os = "espidf")]
    _wifi: esp_idf_svc::wifi::BlockingWifi<esp_idf_svc::wifi::EspWifi<'static>>,
    config: SoftApConfig,
}

impl SoftAp {
    #[cfg(target_os = "espidf")]
    pub fn start(
        modem: esp_idf_hal::modem::Modem,
        sysloop: esp_idf_svc::eventloop::EspSystemEventLoop,
        config: SoftApConfig,
    ) -> Result<Self, ApError> {
        use esp_idf_svc::wifi::{
            AccessPointConfiguration, AuthMethod, BlockingWifi, Configuration, EspWifi,
        };

        let fail = |e: esp_idf_svc::sys::EspError| {
            log::error!("wifi: {}", e);
            ApError::StartFailed
        };

        let esp_wifi = EspWifi::new(modem, sysloop.clone(), None).map_err(fail)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop).map_err(fail)?;

        let ssid = config
            .ssid
            .as_str()
            .try_into()
            .map_err(|_| ApError::InvalidSsid)?;
        wifi.set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
            ssid,
            channel: config.channel,
            auth_method: AuthMethod::None,
            max_connections: config.max_connections,
            ..Default::default()
        }))
        .map_err(fail)?;

        wifi.start().map_err(fail)?;
        wifi.wait_netif_up().map_err(fail)?;

        info!(
            "wifi: soft-AP '{}' up on channel {}",
            config.ssid, config.channel
        );
        Ok(Self {
            _wifi: wifi,
            config,
        })
    }

    /// Simulation: nothing to bring up.
    #[cfg(not(target_os = "espidf"))]
    pub fn start(config: SoftApConfig) -> Result<Self, ApError> {
        info!("wifi(sim): soft-AP '{}' (no radio)", config.ssid);
        Ok(Self { config })
    }

    pub fn config(&self) -> &SoftApConfig {
        &self.config
    }
}
