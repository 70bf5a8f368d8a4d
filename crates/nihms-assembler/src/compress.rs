//! Stream compression layered over an archive reader.

use std::io::Read;

use crate::format::CompressionFormat;

/// Wrap `archive` in a pull-based encoder for `compression`.
///
/// Zip packages compress their entries individually, so [`CompressionFormat::Zip`]
/// adds no outer layer.
pub(crate) fn compress(
    archive: Box<dyn Read + Send>,
    compression: CompressionFormat,
) -> Box<dyn Read + Send> {
    match compression {
        CompressionFormat::None | CompressionFormat::Zip => archive,
        CompressionFormat::Gzip => Box::new(flate2::read::GzEncoder::new(
            archive,
            flate2::Compression::default(),
        )),
        CompressionFormat::Bzip2 => Box::new(bzip2::read::BzEncoder::new(
            archive,
            bzip2::Compression::default(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn payload() -> Vec<u8> {
        b"nihms native package ".repeat(64)
    }

    fn compressed(compression: CompressionFormat) -> Vec<u8> {
        let mut out = Vec::new();
        compress(Box::new(Cursor::new(payload())), compression)
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn gzip_round_trip() {
        let bytes = compressed(CompressionFormat::Gzip);
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        let mut out = Vec::new();
        flate2::read::GzDecoder::new(bytes.as_slice())
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, payload());
    }

    #[test]
    fn bzip2_round_trip() {
        let bytes = compressed(CompressionFormat::Bzip2);
        assert_eq!(&bytes[..3], b"BZh");
        let mut out = Vec::new();
        bzip2::read::BzDecoder::new(bytes.as_slice())
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, payload());
    }

    #[test]
    fn none_and_zip_pass_through() {
        assert_eq!(compressed(CompressionFormat::None), payload());
        assert_eq!(compressed(CompressionFormat::Zip), payload());
    }
}
