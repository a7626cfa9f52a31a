//! Protobuf definitions for the stream session gRPC surface.
//!
//! Generated at build time from `proto/stream.proto`.

#![allow(clippy::all)]

pub mod stream {
    tonic::include_proto!("stream_session.stream");
}

/// Encoded file descriptor set, registered with the reflection service.
pub const FILE_DESCRIPTOR_SET: &[u8] =
    tonic::include_file_descriptor_set!("stream_session_descriptor");
