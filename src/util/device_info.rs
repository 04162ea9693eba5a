//! Device identity accessors.
//!
//! Each accessor writes a NUL-terminated byte string into a caller buffer.
//! An empty buffer stands for "no buffer": the string accessors do nothing
//! and report zero bytes written.

use core::fmt::Write;

use heapless::String;
use log::error;

use crate::config::{self, DeviceIdentity, IDENTITY_STR_LEN, MD5_HASH_LEN};
use crate::util::UtilError;

/// Characters in a rendered serial number.
pub const SERIAL_LEN: usize = MD5_HASH_LEN * 2;

const DEVICE_VERSION_PREFIX: &str = "cmtp-responder ";

/// Longest device version built from a [`DeviceIdentity`],
/// `"cmtp-responder <version> (<build>)"`.
pub const DEVICE_VERSION_LEN: usize = DEVICE_VERSION_PREFIX.len() + 2 * IDENTITY_STR_LEN + 3;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Copies `src` into `buf`, truncating to leave room for the NUL.
///
/// Returns the number of bytes copied, excluding the terminator.
fn copy_truncated(buf: &mut [u8], src: &[u8]) -> usize {
    if buf.is_empty() {
        return 0;
    }
    let n = core::cmp::min(src.len(), buf.len() - 1);
    buf[..n].copy_from_slice(&src[..n]);
    buf[n] = 0;
    n
}

/// Formats into a caller buffer, keeping whatever fits before the NUL.
struct TruncatingWriter<'b> {
    buf: &'b mut [u8],
    len: usize,
}

impl Write for TruncatingWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let room = self.buf.len().saturating_sub(1) - self.len;
        let n = core::cmp::min(room, s.len());
        self.buf[self.len..self.len + n].copy_from_slice(&s.as_bytes()[..n]);
        self.len += n;
        Ok(())
    }
}

fn write_device_version(buf: &mut [u8], version: &str, build_info: &str) -> usize {
    if buf.is_empty() {
        return 0;
    }
    let mut w = TruncatingWriter { buf, len: 0 };
    // never fails, the writer truncates instead
    let _ = write!(w, "{}{} ({})", DEVICE_VERSION_PREFIX, version, build_info);
    let len = w.len;
    w.buf[len] = 0;
    len
}

fn render_serial(buf: &mut [u8], hash: &[u8; MD5_HASH_LEN]) -> Result<usize, UtilError> {
    if buf.len() <= SERIAL_LEN {
        error!("serial buffer holds {} bytes, need more than {}", buf.len(), SERIAL_LEN);
        return Err(UtilError::BufferTooSmall {
            needed: SERIAL_LEN,
            capacity: buf.len(),
        });
    }
    for (i, byte) in hash.iter().enumerate() {
        buf[i * 2] = HEX[(byte >> 4) as usize];
        buf[i * 2 + 1] = HEX[(byte & 0x0f) as usize];
    }
    buf[SERIAL_LEN] = 0;
    Ok(SERIAL_LEN)
}

fn copy_path(buf: &mut [u8], path: &str) -> Result<usize, UtilError> {
    if buf.len() <= path.len() {
        error!("external path buffer holds {} bytes, need more than {}", buf.len(), path.len());
        return Err(UtilError::BufferTooSmall {
            needed: path.len(),
            capacity: buf.len(),
        });
    }
    Ok(copy_truncated(buf, path.as_bytes()))
}

/// Writes the upper-case hex serial number derived from the build hash.
///
/// Fails, leaving `buf` untouched, unless `buf.len() > SERIAL_LEN`.
pub fn get_serial(buf: &mut [u8]) -> Result<usize, UtilError> {
    render_serial(buf, &config::HASH_VALUE)
}

pub fn get_vendor_ext_desc(buf: &mut [u8]) -> usize {
    copy_truncated(buf, config::VENDOR_EXTENSION_DESC.as_bytes())
}

pub fn get_model_name(buf: &mut [u8]) -> usize {
    copy_truncated(buf, config::MODEL.as_bytes())
}

pub fn get_device_version(buf: &mut [u8]) -> usize {
    write_device_version(buf, config::DEVICE_VERSION, config::BUILD_INFO)
}

/// Writes the external storage path.
///
/// Unlike the string accessors this never truncates: a buffer that cannot
/// hold the whole path and its NUL is rejected and left untouched.
pub fn get_external_path(buf: &mut [u8]) -> Result<usize, UtilError> {
    copy_path(buf, config::EXTERNAL_PATH)
}

impl DeviceIdentity {
    pub fn get_serial(&self, buf: &mut [u8]) -> Result<usize, UtilError> {
        render_serial(buf, &self.hash)
    }

    /// Serial number as a string, for dataset encoding.
    pub fn serial(&self) -> String<SERIAL_LEN> {
        let mut raw = [0u8; SERIAL_LEN + 1];
        let mut out = String::new();
        if render_serial(&mut raw, &self.hash).is_ok() {
            for b in &raw[..SERIAL_LEN] {
                let _ = out.push(*b as char);
            }
        }
        out
    }

    pub fn get_vendor_ext_desc(&self, buf: &mut [u8]) -> usize {
        copy_truncated(buf, self.vendor_extension_desc.as_bytes())
    }

    pub fn get_model_name(&self, buf: &mut [u8]) -> usize {
        copy_truncated(buf, self.model.as_bytes())
    }

    pub fn device_version(&self) -> String<DEVICE_VERSION_LEN> {
        let mut raw = [0u8; DEVICE_VERSION_LEN + 1];
        let len = write_device_version(&mut raw, &self.device_version, &self.build_info);
        let mut out = String::new();
        // both fields are valid UTF-8 and fit whole, so nothing is cut
        if let Ok(s) = core::str::from_utf8(&raw[..len]) {
            let _ = out.push_str(s);
        }
        out
    }

    pub fn get_device_version(&self, buf: &mut [u8]) -> usize {
        write_device_version(buf, &self.device_version, &self.build_info)
    }

    pub fn get_external_path(&self, buf: &mut [u8]) -> Result<usize, UtilError> {
        copy_path(buf, &self.external_path)
    }
}
