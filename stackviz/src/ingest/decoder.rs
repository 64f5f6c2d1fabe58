//! Datagram → [`Sample`] decoding.

use stackviz_common::{Sample, SAMPLE_SIZE};

use crate::domain::WireError;

/// Decode one datagram into a sample.
///
/// # Errors
/// Returns [`WireError::InvalidLength`] if the datagram is not exactly
/// [`SAMPLE_SIZE`] bytes. No partial sample is ever produced.
pub fn decode_sample(datagram: &[u8]) -> Result<Sample, WireError> {
    Sample::from_bytes(datagram)
        .ok_or(WireError::InvalidLength { expected: SAMPLE_SIZE, actual: datagram.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_values() {
        let sample = Sample {
            stack_depth: 3,
            timestamp_ns: 1_234_567_890,
            pc: 0x0000_5555_5555_5149,
            sp: 0x0000_7ffd_c0de_0ab0,
        };

        let decoded = decode_sample(&sample.to_bytes()).unwrap();
        assert_eq!(decoded, sample);
    }

    #[test]
    fn test_decode_extreme_values() {
        let sample = Sample { stack_depth: u32::MAX, timestamp_ns: u64::MAX, pc: 0, sp: u64::MAX };
        assert_eq!(decode_sample(&sample.to_bytes()).unwrap(), sample);
    }

    #[test]
    fn test_decode_rejects_short_and_long_datagrams() {
        for len in [0, 1, 4, 20, 27, 29, 64, 1024] {
            let buf = vec![0u8; len];
            match decode_sample(&buf) {
                Err(WireError::InvalidLength { expected, actual }) => {
                    assert_eq!(expected, SAMPLE_SIZE);
                    assert_eq!(actual, len);
                }
                Ok(sample) => panic!("length {len} decoded into {sample:?}"),
            }
        }
    }
}
