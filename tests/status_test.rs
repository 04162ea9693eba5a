mod common;

use std::sync::Arc;
use std::thread;

use embassy_usb::Handler;
use mtp_responder::{PhoneStatus, PhoneStatusValue, UsbStatusHandler};

static PHONE_STATUS: PhoneStatus = PhoneStatus::new();

#[test]
fn test_handler_tracks_configuration() {
    let status = PhoneStatus::new();
    status.set_local_usb_status(PhoneStatusValue::UsbDisconnected);

    let mut handler = UsbStatusHandler::new(&status);
    handler.reset();
    handler.addressed(5);
    handler.configured(true);
    assert_eq!(status.get_local_usb_status(), PhoneStatusValue::UsbConnected);

    handler.configured(false);
    assert_eq!(status.get_local_usb_status(), PhoneStatusValue::UsbDisconnected);
}

#[test]
fn test_handler_disable_marks_disconnected() {
    let status = PhoneStatus::new();
    let mut handler = UsbStatusHandler::new(&status);
    handler.enabled(true);
    handler.configured(true);
    handler.suspended(true);
    assert_eq!(status.get_local_usb_status(), PhoneStatusValue::UsbConnected);

    handler.enabled(false);
    assert_eq!(status.get_local_usb_status(), PhoneStatusValue::UsbDisconnected);
    assert_eq!(status.get_local_usbmode_status(), PhoneStatusValue::UsbConnected);
}

#[test]
fn test_static_record() {
    PHONE_STATUS.set_local_usbmode_status(PhoneStatusValue::UsbModeOther);
    assert_eq!(PHONE_STATUS.get_local_usbmode_status(), PhoneStatusValue::UsbModeOther);
}

#[test]
fn test_concurrent_writers() {
    let status = Arc::new(PhoneStatus::new());
    let values = [PhoneStatusValue::MmcInserted, PhoneStatusValue::MmcNone];

    let workers: Vec<_> = values
        .iter()
        .map(|&val| {
            let status = status.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    status.set_local_usb_status(val);
                    status.set_local_usbmode_status(val);
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let record = status.snapshot();
    assert!(values.contains(&record.usb_state));
    assert!(values.contains(&record.usb_mode_state));
}
