//! Payload decompression.
//!
//! Submissions are usually bzip2-compressed but plain XML is accepted too.
//! Failing to decompress is not an error; the bytes are then parsed as they
//! are and only a parse failure rejects the submission.

use std::borrow::Cow;
use std::io::Read;

use bzip2::read::BzDecoder;

use crate::error::SubmissionError;
use crate::logging::structured::LogContext;

const BZIP2_MAGIC: &[u8] = b"BZh";

/// Decompress `raw` if it is bzip2 data, enforcing `limit` on the result.
pub fn decompress_submission<'a>(
    raw: &'a [u8],
    limit: usize,
    ctx: &LogContext,
) -> Result<Cow<'a, [u8]>, SubmissionError> {
    if !raw.starts_with(BZIP2_MAGIC) {
        return check_size(raw.len(), limit).map(|_| Cow::Borrowed(raw));
    }

    let mut decoded = Vec::new();
    let mut reader = BzDecoder::new(raw).take(limit as u64 + 1);
    match reader.read_to_end(&mut decoded) {
        Ok(_) => {
            check_size(decoded.len(), limit)?;
            log::debug!(
                "{} SUBMISSION_DECOMPRESSED compressed={} decompressed={}",
                ctx,
                raw.len(),
                decoded.len()
            );
            Ok(Cow::Owned(decoded))
        }
        Err(err) => {
            log::debug!("{} SUBMISSION_NOT_BZIP2 error={}", ctx, err);
            check_size(raw.len(), limit).map(|_| Cow::Borrowed(raw))
        }
    }
}

fn check_size(size: usize, limit: usize) -> Result<(), SubmissionError> {
    if size > limit {
        return Err(SubmissionError::TooLarge { size, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use bzip2::write::BzEncoder;
    use bzip2::Compression;

    use super::*;

    fn ctx() -> LogContext {
        LogContext::new("decompress-test", "run-test")
    }

    fn compress(data: &[u8]) -> Vec<u8> {
        let mut encoder = BzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_plain_xml_passes_through() {
        let raw = b"<system version=\"1.0\"/>";
        let result = decompress_submission(raw, 1024, &ctx()).unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(&*result, raw);
    }

    #[test]
    fn test_bzip2_is_decompressed() {
        let xml = b"<system version=\"1.0\"><summary/></system>";
        let compressed = compress(xml);
        let result = decompress_submission(&compressed, 1024, &ctx()).unwrap();
        assert_eq!(&*result, xml);
    }

    #[test]
    fn test_broken_bzip2_is_used_as_is() {
        let raw = b"BZh9 this is not really compressed";
        let result = decompress_submission(raw, 1024, &ctx()).unwrap();
        assert_eq!(&*result, raw);
    }

    #[test]
    fn test_size_limit() {
        let big = vec![b'x'; 4096];
        let compressed = compress(&big);
        assert!(compressed.len() < 1024);
        assert!(matches!(
            decompress_submission(&compressed, 1024, &ctx()),
            Err(SubmissionError::TooLarge { limit: 1024, .. })
        ));
        assert!(matches!(
            decompress_submission(&big, 1024, &ctx()),
            Err(SubmissionError::TooLarge { size: 4096, limit: 1024 })
        ));
    }
}
