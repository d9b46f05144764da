fn main() {
    // Rebuild if the embedded WGSL shaders change
    println!("cargo:rerun-if-changed=shaders/solver.wgsl");
    println!("cargo:rerun-if-changed=shaders/particles.wgsl");
    println!("cargo:rerun-if-changed=shaders/mesh.wgsl");
}
