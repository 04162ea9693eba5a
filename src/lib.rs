//! Host-side utility layer of an MTP device responder.
//!
//! Provides the device identity strings advertised in the MTP DeviceInfo
//! dataset, the USB status record, the external storage path and a bounded
//! wait for a user session to come up.

pub mod config;
pub mod usb;
pub mod util;

/// Raw mutex used for every shared record in this crate.
pub type RawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

pub use config::DeviceIdentity;
pub use util::session::{LoginMonitor, WaitOutcome, wait_for_user};
pub use util::status::{PhoneStatus, PhoneStatusValue, StatusRecord, UsbStatusHandler};
pub use util::{ConfigError, Errno, UtilError};
