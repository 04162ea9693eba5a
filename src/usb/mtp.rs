//! Identity part of the MTP DeviceInfo dataset.

use core::fmt;

use crate::config::DeviceIdentity;

/// PTP strings carry at most 255 UTF-16 units, terminator included.
const PTP_STRING_MAX_CHARS: usize = 254;

/// Errors returned by the dataset writers.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MtpError {
    BufferOverflow,
}

impl fmt::Display for MtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MtpError::BufferOverflow => write!(f, "dataset does not fit in buffer"),
        }
    }
}

fn reserve<'b>(buf: &'b mut [u8], offset: &mut usize, len: usize) -> Result<&'b mut [u8], MtpError> {
    let end = offset.checked_add(len).ok_or(MtpError::BufferOverflow)?;
    let slot = buf.get_mut(*offset..end).ok_or(MtpError::BufferOverflow)?;
    *offset = end;
    Ok(slot)
}

/// UTF-16 units of `s` that fit in a PTP string, never splitting a surrogate pair.
fn ptp_char_count(s: &str) -> usize {
    let mut count = 0;
    for c in s.chars() {
        let units = c.len_utf16();
        if count + units > PTP_STRING_MAX_CHARS {
            break;
        }
        count += units;
    }
    count
}

// PTP string format: len (u8), UTF-16LE chars, 0x0000 terminator
pub fn write_string(buf: &mut [u8], offset: &mut usize, s: &str) -> Result<(), MtpError> {
    let chars = ptp_char_count(s);
    if chars == 0 {
        reserve(buf, offset, 1)?[0] = 0;
        return Ok(());
    }

    let slot = reserve(buf, offset, 1 + chars * 2 + 2)?;
    slot[0] = (chars + 1) as u8; // total chars incl. null
    for (i, c) in s.encode_utf16().take(chars).enumerate() {
        slot[1 + i * 2..3 + i * 2].copy_from_slice(&c.to_le_bytes());
    }
    slot[1 + chars * 2] = 0;
    slot[2 + chars * 2] = 0;
    Ok(())
}

/// Writes Manufacturer, Model, DeviceVersion and SerialNumber, the strings
/// closing a DeviceInfo dataset.
pub fn write_device_identity(buf: &mut [u8], offset: &mut usize, identity: &DeviceIdentity) -> Result<(), MtpError> {
    write_string(buf, offset, &identity.manufacturer)?;
    write_string(buf, offset, &identity.model)?;
    write_string(buf, offset, &identity.device_version())?;
    write_string(buf, offset, &identity.serial())
}
