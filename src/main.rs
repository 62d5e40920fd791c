//! Interactive 3D solar system viewer.
//!
//! Controls: drag with the left mouse button to rotate, scroll to zoom,
//! Up/Down arrows to add angular drift, 1/2 to lengthen/shorten every
//! orbital period, Escape or close to quit.

use anyhow::Result;
use winit::event_loop::{ControlFlow, EventLoop};

mod app;
mod camera;
mod geometry;
mod planets;
mod renderer;
mod sim;

use crate::app::App;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app)?;

    Ok(())
}
