//! Length-prefixed JSON framing.
//!
//! ```text
//! +----------------------+-------------------------------+
//! | length: u32 (BE)     | payload: UTF-8 JSON object    |
//! +----------------------+-------------------------------+
//! ```
//!
//! - The length prefix is read through [`LengthDelimitedCodec`], which rejects
//!   prefixes above `max_frame_length` before allocating anything.
//! - A stream that closes in the middle of a frame is reported as end-of-stream.
//! - A payload that does not deserialize into the expected message type is malformed.

use std::{io, marker::PhantomData};

use bytes::{Bytes, BytesMut};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec, LengthDelimitedCodecError};

use super::dto::wire::{ClientMessage, ServerMessage};

/// Default cap for a single payload (8 MiB)
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 8 * 1024 * 1024;

/// Size of the length prefix in bytes
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Framing errors
#[derive(Debug, Error)]
pub enum FrameError {
    /// Transport failure
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// The length prefix announced more than the configured maximum
    #[error("frame exceeds the maximum length of {max} bytes")]
    TooLarge { max: usize },

    /// The payload is not a valid message
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Codec decoding `D` and encoding `E` as length-prefixed JSON frames
#[derive(Debug)]
pub struct FrameCodec<D, E> {
    inner: LengthDelimitedCodec,
    max_frame_length: usize,
    _marker: PhantomData<fn() -> (D, E)>,
}

/// Server side: reads client messages, writes server messages
pub type ServerCodec = FrameCodec<ClientMessage, ServerMessage>;

/// Client side: reads server messages, writes client messages
pub type ClientCodec = FrameCodec<ServerMessage, ClientMessage>;

impl<D, E> FrameCodec<D, E> {
    pub fn new(max_frame_length: usize) -> Self {
        let inner = LengthDelimitedCodec::builder()
            .length_field_offset(0)
            .length_field_length(LENGTH_PREFIX_SIZE)
            .big_endian()
            .max_frame_length(max_frame_length)
            .new_codec();
        Self {
            inner,
            max_frame_length,
            _marker: PhantomData,
        }
    }

    pub fn max_frame_length(&self) -> usize {
        self.max_frame_length
    }

    fn classify(&self, error: io::Error) -> FrameError {
        let too_large = error
            .get_ref()
            .is_some_and(|inner| inner.is::<LengthDelimitedCodecError>());
        if too_large {
            FrameError::TooLarge {
                max: self.max_frame_length,
            }
        } else {
            FrameError::Io(error)
        }
    }
}

impl<D, E> Default for FrameCodec<D, E> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LENGTH)
    }
}

impl<D, E> Clone for FrameCodec<D, E> {
    fn clone(&self) -> Self {
        Self::new(self.max_frame_length)
    }
}

impl<D: DeserializeOwned, E> Decoder for FrameCodec<D, E> {
    type Item = D;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<D>, FrameError> {
        match self.inner.decode(src) {
            Ok(Some(payload)) => Ok(Some(serde_json::from_slice(&payload)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(self.classify(e)),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<D>, FrameError> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None => {
                if !src.is_empty() {
                    tracing::debug!(
                        "Stream closed with {} bytes of an incomplete frame",
                        src.len()
                    );
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

impl<D, E: Serialize> Encoder<E> for FrameCodec<D, E> {
    type Error = FrameError;

    fn encode(&mut self, item: E, dst: &mut BytesMut) -> Result<(), FrameError> {
        let payload = serde_json::to_vec(&item)?;
        self.inner
            .encode(Bytes::from(payload), dst)
            .map_err(|e| self.classify(e))
    }
}

/// Encode a single message into a complete frame
pub fn encode_frame<T: Serialize>(message: &T) -> Result<Bytes, FrameError> {
    let payload = serde_json::to_vec(message)?;
    let length = u32::try_from(payload.len()).map_err(|_| FrameError::TooLarge {
        max: u32::MAX as usize,
    })?;

    let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use tokio_util::codec::FramedRead;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut bytes = (payload.len() as u32).to_be_bytes().to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_encode_frame_layout() {
        // テスト項目: フレームは 4 バイトのビッグエンディアン長 + JSON 本文で構成される
        // given (前提条件):
        let message = ClientMessage::Hello;

        // when (操作):
        let bytes = encode_frame(&message).unwrap();

        // then (期待する結果):
        let payload = br#"{"type":"HELLO"}"#;
        assert_eq!(&bytes[..4], &(payload.len() as u32).to_be_bytes());
        assert_eq!(&bytes[4..], payload);
    }

    #[test]
    fn test_codec_encoder_matches_encode_frame() {
        // テスト項目: Encoder 実装と encode_frame が同じバイト列を出力する
        // given (前提条件):
        let mut codec = ServerCodec::default();
        let message = ServerMessage::DocState {
            content: "hello".to_string(),
        };
        let mut dst = BytesMut::new();

        // when (操作):
        codec.encode(message.clone(), &mut dst).unwrap();

        // then (期待する結果):
        assert_eq!(dst.freeze(), encode_frame(&message).unwrap());
    }

    #[test]
    fn test_decode_waits_for_whole_frame() {
        // テスト項目: 本文が揃うまでは None を返し、揃った時点でメッセージを返す
        // given (前提条件):
        let mut codec = ServerCodec::default();
        let bytes = frame(br#"{"type":"HELLO"}"#);
        let mut src = BytesMut::from(&bytes[..6]);

        // when (操作):
        let partial = codec.decode(&mut src).unwrap();
        src.extend_from_slice(&bytes[6..]);
        let complete = codec.decode(&mut src).unwrap();

        // then (期待する結果):
        assert_eq!(partial, None);
        assert_eq!(complete, Some(ClientMessage::Hello));
    }

    #[test]
    fn test_decode_rejects_oversize_prefix() {
        // テスト項目: 上限を超える長さプレフィックスは TooLarge エラーになる
        // given (前提条件):
        let mut codec = ServerCodec::new(16);
        let mut src = BytesMut::from(&frame(&[b'x'; 17])[..]);

        // when (操作):
        let result = codec.decode(&mut src);

        // then (期待する結果):
        assert!(matches!(result, Err(FrameError::TooLarge { max: 16 })));
    }

    #[test]
    fn test_decode_rejects_non_json_payload() {
        // テスト項目: JSON として解釈できない本文は Malformed エラーになる
        // given (前提条件):
        let mut codec = ServerCodec::default();
        let mut src = BytesMut::from(&frame(b"not json")[..]);

        // when (操作):
        let result = codec.decode(&mut src);

        // then (期待する結果):
        assert!(matches!(result, Err(FrameError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_truncated_frame_is_end_of_stream() {
        // テスト項目: 50 バイトを予告して 10 バイトで閉じたストリームは終端として扱われる
        // given (前提条件):
        let mut bytes = 50u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[b'{'; 10]);
        let mut frames = FramedRead::new(&bytes[..], ServerCodec::default());

        // when (操作):
        let next = frames.next().await;

        // then (期待する結果):
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn test_stream_of_frames() {
        // テスト項目: 連続したフレームを順番に読み出せる
        // given (前提条件):
        let mut bytes = frame(br#"{"type":"HELLO"}"#);
        bytes.extend(frame(br#"{"type":"CHAT","text":"hi","token":"t"}"#));
        let mut frames = FramedRead::new(&bytes[..], ServerCodec::default());

        // when (操作):
        let first = frames.next().await.unwrap().unwrap();
        let second = frames.next().await.unwrap().unwrap();
        let end = frames.next().await;

        // then (期待する結果):
        assert_eq!(first, ClientMessage::Hello);
        assert_eq!(
            second,
            ClientMessage::Chat {
                text: "hi".to_string(),
                token: Some("t".to_string())
            }
        );
        assert!(end.is_none());
    }
}
