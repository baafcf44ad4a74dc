/// Terminal viewer for meshkit scenes
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use meshkit_core::transform::translation_matrix;
use meshkit_core::{Camera, RenderMesh, Transform};
use nalgebra::{Matrix4, Vector3};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::{AsciiRenderer, DrawParams};

/// Degrees per key press
const ROTATE_STEP: f32 = 5.0;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    meshes: Vec<RenderMesh>,
    /// Placement of the unit-cube meshes, centred on the origin
    object: Transform,
    eye: Transform,
    camera: Camera,
    renderer: AsciiRenderer,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Expects meshes already normalized into the unit cube
    pub fn new(meshes: Vec<RenderMesh>) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(meshes, width as usize, height as usize))
    }

    pub fn with_size(meshes: Vec<RenderMesh>, width: usize, height: usize) -> Self {
        Self {
            meshes,
            object: Transform::new(Vector3::zeros(), Vector3::new(20.0, 30.0, 0.0), Vector3::repeat(1.5)),
            // Back on +Z, turned around to look at the origin
            eye: Transform::new(Vector3::new(0.0, 0.0, 3.0), Vector3::new(0.0, 180.0, 0.0), Vector3::repeat(1.0)),
            // Terminal cells are roughly twice as tall as they are wide
            camera: Camera::new(width as f32 / (2.0 * height.max(1) as f32), 45.0, 0.1, 100.0),
            renderer: AsciiRenderer::new(width, height),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            if event::poll(Duration::from_millis(0))? {
                self.handle_input()?;
            }

            self.update();
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        if let Event::Key(KeyEvent { code, .. }) = event::read()? {
            match code {
                KeyCode::Char('q') | KeyCode::Esc => self.running = false,
                KeyCode::Char('w') | KeyCode::Up => self.object.rotate(ROTATE_STEP, 0.0, 0.0),
                KeyCode::Char('s') | KeyCode::Down => self.object.rotate(-ROTATE_STEP, 0.0, 0.0),
                KeyCode::Char('a') | KeyCode::Left => self.object.rotate(0.0, -ROTATE_STEP, 0.0),
                KeyCode::Char('d') | KeyCode::Right => self.object.rotate(0.0, ROTATE_STEP, 0.0),
                KeyCode::Char('e') => self.object.rotate(0.0, 0.0, ROTATE_STEP),
                KeyCode::Char('r') => self.object.rotate(0.0, 0.0, -ROTATE_STEP),
                _ => {}
            }
        }
        Ok(())
    }

    fn update(&mut self) {
        // Continuous slow rotation for demo effect
        self.object.rotate(0.5, 0.8, 0.0);
    }

    /// Model matrix: centre the unit cube on the origin, then place it
    pub fn model_matrix(&self) -> Matrix4<f32> {
        self.object.matrix() * translation_matrix(&Vector3::repeat(-0.5))
    }

    /// Rasterize every mesh into the character buffer
    pub fn rasterize(&mut self) -> &AsciiRenderer {
        let model = self.model_matrix();
        let view = self.camera.view_matrix(&self.eye);
        let projection = self.camera.perspective_matrix();
        let params = DrawParams {
            model: &model,
            view: &view,
            projection: &projection,
            light: self.eye.forward(),
        };

        self.renderer.clear();
        for mesh in &self.meshes {
            self.renderer.render_mesh(mesh, &params);
        }
        &self.renderer
    }

    fn render(&mut self) -> io::Result<()> {
        let fps = self.fps;
        let renderer = self.rasterize();

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "meshkit | FPS: {:.1} | Controls: WASD/Arrows=Rotate E/R=Roll Q=Quit",
                fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
