// build.rs

//! Generates the gRPC service and message types from `proto/`.
//!
//! `protoc` comes from `protoc-bin-vendored` so no system install is needed.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto = "proto/spice_simulator.proto";
    println!("cargo:rerun-if-changed={proto}");

    let mut config = prost_build::Config::new();
    config.protoc_executable(protoc_bin_vendored::protoc_bin_path()?);

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos_with_config(config, &[proto], &["proto"])?;

    Ok(())
}
