// Eyeball Hunt: click the eye before the clock runs out

use anyhow::Context;
use eyeball_hunt::{renderer::Renderer, Game, GameConfig};
use winit::event_loop::EventLoop;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GameConfig::from_args()?;
    log::info!(
        "Starting: sensitivity={}, window={}x{}",
        config.sensitivity,
        config.width,
        config.height
    );

    // Create event loop
    let event_loop = EventLoop::new().context("failed to create event loop")?;

    // Create renderer
    let renderer = Renderer::new(&event_loop, Game::new(config))
        .await
        .context("failed to initialise the renderer")?;

    // Run the game
    renderer.run(event_loop)?;

    log::info!("Shutting down");
    Ok(())
}
