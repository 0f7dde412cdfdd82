//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`] for the speed limits.  Floats are stored as
//! 4-byte little-endian blobs in one namespace; a blob of any other size
//! reads back as "absent" so the caller falls back to its default.
//!
//! Every write is followed by `nvs_commit()`, so a successful
//! `set_float` survives a power cycle.

use crate::app::ports::{StorageError, StoragePort};
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;
#[cfg(not(target_os = "espidf"))]
use std::sync::Mutex;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// NVS keys and namespaces are limited to 15 characters.
const NVS_NAME_MAX: usize = 15;

pub struct NvsAdapter {
    namespace: heapless::String<16>,
    #[cfg(not(target_os = "espidf"))]
    store: Mutex<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Initialise NVS flash and bind to `namespace`.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new(namespace: &str) -> Result<Self, StorageError> {
        let mut ns: heapless::String<16> = heapless::String::new();
        for c in namespace.chars() {
            if ns.len() + c.len_utf8() > NVS_NAME_MAX {
                break;
            }
            ns.push(c).map_err(|()| StorageError::IoError)?;
        }

        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS use.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32
                || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32
            {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK as i32
                    || unsafe { nvs_flash_init() } != ESP_OK as i32
                {
                    return Err(StorageError::IoError);
                }
            } else if ret != ESP_OK as i32 {
                return Err(StorageError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised (namespace '{}')", ns);
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend (namespace '{}')", ns);

        Ok(Self {
            namespace: ns,
            #[cfg(not(target_os = "espidf"))]
            store: Mutex::new(HashMap::new()),
        })
    }

    /// Null-terminated copy of a key or namespace, truncated to NVS limits.
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(NVS_NAME_MAX);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open the namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(&self, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(&self.namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    // ── Raw blobs ─────────────────────────────────────────────

    /// Read a blob into `buf`, returning its stored length.
    pub fn read_blob(&self, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let store = self.store.lock().map_err(|_| StorageError::IoError)?;
            let data = store.get(key).ok_or(StorageError::NotFound)?;
            if data.len() > buf.len() {
                return Err(StorageError::IoError);
            }
            buf[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = self.with_nvs_handle(false, |handle| {
                let key_buf = Self::c_name(key);
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_buf.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND as i32 => Err(StorageError::NotFound),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    /// Write and commit a blob.
    pub fn write_blob(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let mut store = self.store.lock().map_err(|_| StorageError::IoError)?;
            store.insert(key.to_string(), data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = self.with_nvs_handle(true, |handle| {
                let key_buf = Self::c_name(key);
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key_buf.as_ptr() as *const _,
                        data.as_ptr() as *const _,
                        data.len(),
                    )
                };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|e| {
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }
}

impl StoragePort for NvsAdapter {
    fn get_float(&self, key: &str, default: f32) -> f32 {
        let mut buf = [0u8; 8];
        match self.read_blob(key, &mut buf) {
            Ok(4) => f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            Ok(size) => {
                warn!("NvsAdapter: '{}' has size {}, using default {}", key, size, default);
                default
            }
            Err(StorageError::NotFound) => default,
            Err(e) => {
                warn!("NvsAdapter: reading '{}' failed ({}), using default {}", key, e, default);
                default
            }
        }
    }

    fn set_float(&self, key: &str, value: f32) -> Result<(), StorageError> {
        self.write_blob(key, &value.to_le_bytes())
    }
}
