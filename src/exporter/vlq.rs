use crate::error::{ExportError, ExportResult};

/// Largest value a four byte variable-length quantity can carry.
pub const MAX_VLQ: i64 = 0x0FFF_FFFF;

const CONTINUATION_BIT: u8 = 0x80;
const GROUP_MASK: i64 = 0x7F;

/// Encodes `value` as a MIDI variable-length quantity, most significant 7-bit group first.
pub fn write_vlq(value: i64) -> ExportResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(4);
    push_vlq(&mut buf, value)?;
    Ok(buf)
}

/// Appends the variable-length encoding of `value` to `buf`. Nothing is written on error.
pub fn push_vlq(buf: &mut Vec<u8>, value: i64) -> ExportResult<()> {
    if value < 0 {
        return Err(ExportError::NegativeDelta(value));
    }
    if value > MAX_VLQ {
        return Err(ExportError::DeltaOverflow(value));
    }

    // Groups are collected least significant first, then written in reverse.
    let mut groups = [0u8; 4];
    let mut len = 0;
    let mut v = value;
    loop {
        groups[len] = (v & GROUP_MASK) as u8;
        len += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }

    for i in (0..len).rev() {
        if i == 0 {
            buf.push(groups[i]);
        } else {
            buf.push(groups[i] | CONTINUATION_BIT);
        }
    }

    Ok(())
}

/// Number of bytes `write_vlq` would produce for an in-range value.
pub fn vlq_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        _ => 4,
    }
}
