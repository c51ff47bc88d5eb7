//! Progress demo
//!
//! Two scopes share the bottom of the terminal: a spinner with elapsed time
//! and a list of running jobs. Finished jobs are logged above the block.
//!
//! Run with `cargo run --example progress`. Set `RUST_LOG=static_text=debug`
//! to see scheduler phase changes (written to `static-text-demo.log`).

use std::cell::Cell;
use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use static_text::{Config, Container, RenderInterval, TextItem};
use tokio::task::LocalSet;
use tokio::time::sleep;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[tokio::main(flavor = "current_thread")]
async fn main() -> static_text::Result<()> {
    // The block is drawn on stderr, so logs go to a file.
    let log_file = File::create("static-text-demo.log")?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
        .with(tracing_subscriber::fmt::layer().with_writer(Mutex::new(log_file)))
        .init();

    let config = Config::from_env()?;
    LocalSet::new().run_until(run(config)).await
}

async fn run(config: Config) -> static_text::Result<()> {
    let container = Container::from_config(&config);
    let interval = RenderInterval::from_config(container.clone(), &config);

    let header = container.create_scope();
    let started = Instant::now();
    let frame = Cell::new(0usize);
    header.set_text(TextItem::deferred(move |_| {
        frame.set((frame.get() + 1) % SPINNER.len());
        format!("{} Working... {:.1}s", SPINNER[frame.get()], started.elapsed().as_secs_f32())
    }));

    let jobs = container.create_scope();
    let mut pending = vec![
        "fetch index",
        "resolve versions",
        "download crates from the registry",
        "compile",
    ];

    let activation = interval.start()?;
    while !pending.is_empty() {
        let mut lines = vec![TextItem::from("Jobs:")];
        lines.extend(pending.iter().map(|job| TextItem::hanging(format!("  - {job}"), 4)));
        jobs.set_text(lines);

        sleep(Duration::from_millis(900)).await;
        let done = pending.remove(0);
        container.log_above(format!("✔ {done}"), None)?;
    }

    header.dispose()?;
    jobs.dispose()?;
    activation.release()?;
    container.log_above("All jobs finished.", None)?;
    Ok(())
}
