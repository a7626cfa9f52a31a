use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // The descriptor set backs gRPC reflection in stream-session-api.
    let out_dir = PathBuf::from(std::env::var("OUT_DIR")?);

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(out_dir.join("stream_session_descriptor.bin"))
        .compile_protos(&["proto/stream.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/stream.proto");

    Ok(())
}
