//! USB connection and USB mode status.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_usb::Handler;
use log::info;

use crate::RawMutex;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum PhoneStatusValue {
    #[default]
    UsbConnected = 0,
    UsbDisconnected = 1,
    UsbModeOther = 2,
    MmcInserted = 3,
    MmcNone = 4,
    LockOn = 5,
    LockOff = 6,
}

impl TryFrom<u8> for PhoneStatusValue {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PhoneStatusValue::UsbConnected),
            1 => Ok(PhoneStatusValue::UsbDisconnected),
            2 => Ok(PhoneStatusValue::UsbModeOther),
            3 => Ok(PhoneStatusValue::MmcInserted),
            4 => Ok(PhoneStatusValue::MmcNone),
            5 => Ok(PhoneStatusValue::LockOn),
            6 => Ok(PhoneStatusValue::LockOff),
            _ => Err(()),
        }
    }
}

impl From<PhoneStatusValue> for u8 {
    fn from(value: PhoneStatusValue) -> Self {
        value as u8
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct StatusRecord {
    pub usb_state: PhoneStatusValue,
    pub usb_mode_state: PhoneStatusValue,
}

/// Status record shared by the responder's components.
///
/// Any value may be stored at any time; there is no transition table.
pub struct PhoneStatus {
    record: Mutex<RawMutex, Cell<StatusRecord>>,
}

impl Default for PhoneStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl PhoneStatus {
    pub const fn new() -> Self {
        PhoneStatus {
            record: Mutex::new(Cell::new(StatusRecord {
                usb_state: PhoneStatusValue::UsbConnected,
                usb_mode_state: PhoneStatusValue::UsbConnected,
            })),
        }
    }

    pub fn get_local_usb_status(&self) -> PhoneStatusValue {
        self.record.lock(|r| r.get().usb_state)
    }

    pub fn set_local_usb_status(&self, val: PhoneStatusValue) {
        self.record.lock(|r| {
            let mut record = r.get();
            record.usb_state = val;
            r.set(record);
        });
    }

    pub fn get_local_usbmode_status(&self) -> PhoneStatusValue {
        self.record.lock(|r| r.get().usb_mode_state)
    }

    pub fn set_local_usbmode_status(&self, val: PhoneStatusValue) {
        self.record.lock(|r| {
            let mut record = r.get();
            record.usb_mode_state = val;
            r.set(record);
        });
    }

    /// Both fields, read under one lock.
    pub fn snapshot(&self) -> StatusRecord {
        self.record.lock(|r| r.get())
    }
}

/// Bus event handler that keeps a [`PhoneStatus`] connection state current.
pub struct UsbStatusHandler<'a> {
    status: &'a PhoneStatus,
}

impl<'a> UsbStatusHandler<'a> {
    pub fn new(status: &'a PhoneStatus) -> Self {
        UsbStatusHandler { status }
    }
}

impl Handler for UsbStatusHandler<'_> {
    fn enabled(&mut self, enabled: bool) {
        if enabled {
            info!("Device enabled");
        } else {
            info!("Device disabled");
            self.status.set_local_usb_status(PhoneStatusValue::UsbDisconnected);
        }
    }

    fn reset(&mut self) {
        info!("Bus reset");
    }

    fn addressed(&mut self, addr: u8) {
        info!("USB address set to: {}", addr);
    }

    fn configured(&mut self, configured: bool) {
        if configured {
            info!("Device configured");
            self.status.set_local_usb_status(PhoneStatusValue::UsbConnected);
        } else {
            info!("Device is no longer configured");
            self.status.set_local_usb_status(PhoneStatusValue::UsbDisconnected);
        }
    }

    fn suspended(&mut self, suspended: bool) {
        if suspended {
            info!("Device suspended");
        } else {
            info!("Device resumed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero_variant() {
        let status = PhoneStatus::new();
        assert_eq!(status.snapshot(), StatusRecord::default());
        assert_eq!(u8::from(status.get_local_usb_status()), 0);
    }

    #[test]
    fn test_set_then_get_returns_value() {
        let status = PhoneStatus::new();
        for raw in 0..=6u8 {
            let val = PhoneStatusValue::try_from(raw).unwrap();
            status.set_local_usb_status(val);
            assert_eq!(status.get_local_usb_status(), val);
        }
    }

    #[test]
    fn test_fields_are_independent() {
        let status = PhoneStatus::new();
        status.set_local_usbmode_status(PhoneStatusValue::UsbModeOther);
        status.set_local_usb_status(PhoneStatusValue::UsbDisconnected);
        assert_eq!(status.get_local_usbmode_status(), PhoneStatusValue::UsbModeOther);
        assert_eq!(status.get_local_usb_status(), PhoneStatusValue::UsbDisconnected);
    }

    #[test]
    fn test_any_transition_allowed() {
        let status = PhoneStatus::new();
        status.set_local_usb_status(PhoneStatusValue::LockOn);
        status.set_local_usb_status(PhoneStatusValue::MmcNone);
        assert_eq!(status.get_local_usb_status(), PhoneStatusValue::MmcNone);
    }

    #[test]
    fn test_unknown_raw_value_rejected() {
        assert_eq!(PhoneStatusValue::try_from(7), Err(()));
    }
}
