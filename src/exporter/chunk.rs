use crate::error::{ExportError, ExportResult};
use crate::exporter::track::PPQN;

pub const HEADER_CHUNK_ID: &[u8; 4] = b"MThd";
pub const TRACK_CHUNK_ID: &[u8; 4] = b"MTrk";

const HEADER_LENGTH: u32 = 6;
/// Format 0: a single multi-channel track.
const FORMAT_SINGLE_TRACK: u16 = 0;
const TRACK_COUNT: u16 = 1;

/// Size of the `MThd` chunk, including its id and length field.
pub const HEADER_CHUNK_LEN: usize = 14;
/// Size of the `MTrk` id and length field that precede the event stream.
pub const TRACK_CHUNK_PREAMBLE_LEN: usize = 8;

pub fn write_header_chunk(buf: &mut Vec<u8>) {
    buf.extend_from_slice(HEADER_CHUNK_ID);
    buf.extend_from_slice(&HEADER_LENGTH.to_be_bytes());
    buf.extend_from_slice(&FORMAT_SINGLE_TRACK.to_be_bytes());
    buf.extend_from_slice(&TRACK_COUNT.to_be_bytes());
    buf.extend_from_slice(&PPQN.to_be_bytes());
}

pub fn write_track_chunk(buf: &mut Vec<u8>, events: &[u8]) -> ExportResult<()> {
    let len = u32::try_from(events.len()).map_err(|_| ExportError::TrackTooLong(events.len()))?;

    buf.extend_from_slice(TRACK_CHUNK_ID);
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(events);

    Ok(())
}

/// Wraps an event stream into a complete Format 0 Standard MIDI File.
pub fn assemble_smf(events: &[u8]) -> ExportResult<Vec<u8>> {
    let mut smf = Vec::with_capacity(HEADER_CHUNK_LEN + TRACK_CHUNK_PREAMBLE_LEN + events.len());
    write_header_chunk(&mut smf);
    write_track_chunk(&mut smf, events)?;

    Ok(smf)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    #[rustfmt::skip]
    fn header_chunk_bytes() {
        let mut buf = Vec::new();
        write_header_chunk(&mut buf);

        assert_eq!(
            buf,
            vec![
                0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x01, 0x01, 0xE0
            ]
        );
        assert_eq!(buf.len(), HEADER_CHUNK_LEN);
    }

    #[test]
    fn track_chunk_is_length_prefixed() {
        let events = [0x01, 0xFF, 0x2F, 0x00];
        let smf = assemble_smf(&events).unwrap();

        assert_eq!(smf.len(), HEADER_CHUNK_LEN + TRACK_CHUNK_PREAMBLE_LEN + events.len());
        assert_eq!(&smf[14..18], b"MTrk");
        assert_eq!(&smf[18..22], &[0x00, 0x00, 0x00, 0x04]);
        assert_eq!(&smf[22..], &events);
    }

    #[test]
    fn track_length_is_big_endian() {
        let events = vec![0u8; 0x0102];
        let mut buf = Vec::new();
        write_track_chunk(&mut buf, &events).unwrap();

        assert_eq!(&buf[4..8], &[0x00, 0x00, 0x01, 0x02]);
    }
}
