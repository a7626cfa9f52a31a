//! gRPC surface of the stream session broker

pub mod grpc;

pub use grpc::{serve, StreamServiceImpl};
