/// meshkit Terminal Viewer
///
/// Usage: meshkit-terminal [scene-file] [config.toml]
///
/// Loads a scene (STL or OBJ), flattens and normalizes it, and spins it in
/// the terminal. Without a scene file a cube is shown.
/// Controls:
///   - WASD / Arrow Keys: Rotate
///   - E/R: Roll rotation
///   - Q/ESC: Quit

use log::{error, info};
use meshkit_core::{load, normalize, LoaderConfig, Mesh, RenderMesh};
use meshkit_terminal::TerminalApp;
use std::env;
use std::io;
use std::process::ExitCode;

fn main() -> io::Result<ExitCode> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let config = match args.get(2) {
        Some(path) => match LoaderConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to read config \"{}\": {}", path, e);
                return Ok(ExitCode::FAILURE);
            }
        },
        None => LoaderConfig::default(),
    }
    // The viewer frames the unit cube
    .with_normalize(true);

    let meshes = match args.get(1) {
        Some(path) => {
            println!("Loading scene: {}", path);
            let meshes = load(path, &config);
            if meshes.is_empty() {
                eprintln!("No meshes loaded from {} (see log output, RUST_LOG=debug)", path);
                return Ok(ExitCode::FAILURE);
            }
            meshes
        }
        None => {
            let program = args.first().map_or("meshkit-terminal", String::as_str);
            eprintln!("Usage: {} [scene-file] [config.toml]", program);
            eprintln!("\nNo scene provided, using default cube...");
            normalize(&Mesh::cube(2.0)).into_iter().collect()
        }
    };

    let render_meshes: Vec<RenderMesh> = meshes.iter().map(RenderMesh::from_mesh).collect();
    let triangles: usize = render_meshes.iter().map(RenderMesh::triangle_count).sum();
    info!("Rendering {} meshes, {} triangles", render_meshes.len(), triangles);

    println!("Starting terminal renderer (press Q to quit)...");
    std::thread::sleep(std::time::Duration::from_secs(1));

    let mut app = TerminalApp::new(render_meshes)?;
    app.run()?;

    println!("Thank you for using the meshkit terminal viewer!");
    Ok(ExitCode::SUCCESS)
}
