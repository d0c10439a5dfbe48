/// Builds the gRPC client and server code for `proto/quire.proto` using
/// `tonic-prost-build`.
///
/// Besides the message and service modules, a serialized file descriptor set
/// is written next to the generated code so the server can expose it through
/// gRPC reflection:
///
/// ```rust
/// pub mod proto {
///     tonic::include_proto!("quire");
///     pub const FILE_DESCRIPTOR_SET: &[u8] =
///         tonic::include_file_descriptor_set!("quire_descriptor");
/// }
/// ```
///
/// # Panics
///
/// Panics if code generation fails; the build cannot continue without the
/// generated bindings.
use std::env;
use std::path::PathBuf;
fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("quire_descriptor.bin");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    println!("cargo:rerun-if-changed=proto/quire.proto");

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/quire.proto"], &["proto"])
        .unwrap();
}
