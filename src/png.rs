//! Minimal PNG writer for thumbnail output.
//!
//! Writes exactly the subset the thumbnailer needs: 8-bit RGBA (color type
//! 6), no interlacing, filter 0 on every scanline, a single IDAT chunk. The
//! input buffer is in the .blend file's bottom-up row order and is flipped
//! on the way out.

use libflate::zlib::Encoder;
use std::io::{self, Write};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];

const CRC_TABLE: [u32; 256] = crc_table();

const fn crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                0xedb8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

fn crc_update(mut crc: u32, data: &[u8]) -> u32 {
    for &byte in data {
        crc = CRC_TABLE[((crc ^ u32::from(byte)) & 0xff) as usize] ^ (crc >> 8);
    }
    crc
}

/// Standard reflected CRC-32 (the PNG and zlib variant).
pub(crate) fn crc32(data: &[u8]) -> u32 {
    crc_update(0xffff_ffff, data) ^ 0xffff_ffff
}

fn write_chunk<W: Write>(writer: &mut W, kind: &[u8; 4], data: &[u8]) -> io::Result<()> {
    writer.write_all(&(data.len() as u32).to_be_bytes())?;
    writer.write_all(kind)?;
    writer.write_all(data)?;

    let mut crc = 0xffff_ffff;
    crc = crc_update(crc, kind);
    crc = crc_update(crc, data);
    writer.write_all(&(crc ^ 0xffff_ffff).to_be_bytes())?;

    Ok(())
}

/// Writes `rgba` as a PNG. The buffer is expected in bottom-up row order
/// (as stored in .blend thumbnails) and must hold exactly
/// `width * height * 4` bytes.
pub fn write_png<W: Write>(mut writer: W, rgba: &[u8], width: u32, height: u32) -> io::Result<()> {
    let stride = width as usize * 4;
    if stride == 0 || height == 0 || rgba.len() != stride * height as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "pixel buffer does not match dimensions",
        ));
    }

    writer.write_all(&PNG_SIGNATURE)?;

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    // Bit depth 8, color type 6 (RGBA), compression 0, filter 0, interlace 0.
    ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);
    write_chunk(&mut writer, b"IHDR", &ihdr)?;

    let mut raw = Vec::with_capacity(height as usize * (stride + 1));
    for row in rgba.chunks(stride).rev() {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = Encoder::new(Vec::new())?;
    encoder.write_all(&raw)?;
    let compressed = encoder.finish().into_result()?;
    write_chunk(&mut writer, b"IDAT", &compressed)?;

    write_chunk(&mut writer, b"IEND", &[])?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use libflate::zlib::Decoder;
    use std::io::Read;

    #[test]
    fn crc32_matches_known_vectors() {
        // The standard check value for "123456789".
        assert_eq!(crc32(b"123456789"), 0xcbf4_3926);
        // The fixed CRC every empty IEND chunk carries.
        assert_eq!(crc32(b"IEND"), 0xae42_6082);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let err = write_png(Vec::new(), &[0; 5], 1, 1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn writes_signature_and_chunk_layout() {
        let mut out = Vec::new();
        write_png(&mut out, &[1, 2, 3, 4], 1, 1).unwrap();

        assert_eq!(&out[..8], &PNG_SIGNATURE);
        // IHDR: length 13, then the chunk type.
        assert_eq!(&out[8..12], &13u32.to_be_bytes());
        assert_eq!(&out[12..16], b"IHDR");
        assert_eq!(&out[16..20], &1u32.to_be_bytes());
        assert_eq!(&out[20..24], &1u32.to_be_bytes());
        assert_eq!(&out[24..29], &[8, 6, 0, 0, 0]);
        let ihdr_crc = u32::from_be_bytes([out[29], out[30], out[31], out[32]]);
        assert_eq!(ihdr_crc, crc32(&out[12..29]));
        // File ends with an empty IEND chunk and its fixed CRC.
        assert_eq!(
            &out[out.len() - 12..],
            &[0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xae, 0x42, 0x60, 0x82]
        );
    }

    #[test]
    fn scanlines_are_filtered_and_flipped() {
        // 1x2 image: bottom row (1,1,1,1), top row (9,9,9,9) in file order.
        let rgba = [1, 1, 1, 1, 9, 9, 9, 9];
        let mut out = Vec::new();
        write_png(&mut out, &rgba, 1, 2).unwrap();

        // IDAT directly follows the 25-byte IHDR chunk.
        let idat_len = u32::from_be_bytes([out[33], out[34], out[35], out[36]]) as usize;
        assert_eq!(&out[37..41], b"IDAT");
        let mut decoder = Decoder::new(&out[41..41 + idat_len]).unwrap();
        let mut raw = Vec::new();
        decoder.read_to_end(&mut raw).unwrap();

        // Two scanlines, filter byte 0, top row first.
        assert_eq!(raw, vec![0, 9, 9, 9, 9, 0, 1, 1, 1, 1]);
    }
}
