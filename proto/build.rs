fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto_files = &["../protos/wasm_host.proto"];

    // Bundled protoc and well-known types, so no system install is needed.
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    let well_known = protoc_bin_vendored::include_path()?;
    let include_dirs = [std::path::PathBuf::from("../protos"), well_known];

    // The CLI only ever calls the host.
    tonic_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(proto_files, &include_dirs)?;

    for file in proto_files {
        println!("cargo:rerun-if-changed={file}");
    }

    Ok(())
}
