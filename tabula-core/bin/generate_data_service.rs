use std::env;
use std::fs;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Generating Tabula data service types...");

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let out_dir = manifest_dir.join("src/proto/generated");

    let proto_folder = manifest_dir.join("proto");
    let proto_files = [
        proto_folder.join("tabula/v2/data.proto"),
        proto_folder.join("google/rpc/status.proto"),
        proto_folder.join("google/longrunning/operations.proto"),
    ];

    if !out_dir.exists() {
        fs::create_dir_all(&out_dir)?;
    }

    // The stubs in `crate::stub` drive `tonic::client::Grpc` directly, so only
    // the messages are generated.
    tonic_prost_build::configure()
        .build_server(false)
        .build_client(false)
        .bytes(["."])
        .out_dir(&out_dir)
        .compile_protos(&proto_files, &[proto_folder])?;

    println!("Done! Generated files are in src/proto/generated");

    Ok(())
}
