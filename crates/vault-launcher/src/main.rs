mod bootstrap;

use anyhow::Result;
use launcher_core::layout::AppLayout;
use launcher_core::settings::{Settings, WindowOptions};
use launcher_runtime::orchestrator::ApplicationOrchestrator;
use launcher_runtime::supervisor::ProcessSupervisor;
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let settings = Settings::load();
    let layout = bootstrap::resolve_layout(&settings)?;

    let home = bootstrap::home_dir();
    bootstrap::ensure_directories_in(&home)?;
    let log_file = bootstrap::log_destination(&settings, &layout, &home);
    bootstrap::setup_logging(&settings.log_level, log_file.as_ref())?;

    tracing::info!("Vault launcher v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Mode: {}, base: {}, resources: {}",
        layout.run_mode,
        layout.base_dir.display(),
        layout.resources_dir.display()
    );

    // The window event loop must own the main thread, so the runtime that
    // hosts the backend output tasks is built by hand rather than via
    // #[tokio::main].
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let supervisor = ProcessSupervisor::with_tracing(layout.executable_target());

    run(supervisor, &layout, settings.window_options(), runtime)
}

#[cfg(feature = "webview")]
fn run(
    supervisor: ProcessSupervisor,
    layout: &AppLayout,
    window_options: WindowOptions,
    runtime: Runtime,
) -> Result<()> {
    let orchestrator =
        ApplicationOrchestrator::new(supervisor, layout.document_path(), window_options);
    launcher_ui::webview::run(orchestrator, runtime)
}

#[cfg(not(feature = "webview"))]
fn run(
    supervisor: ProcessSupervisor,
    layout: &AppLayout,
    window_options: WindowOptions,
    runtime: Runtime,
) -> Result<()> {
    use launcher_ui::headless::HeadlessPresenter;

    let mut orchestrator: ApplicationOrchestrator<_> =
        ApplicationOrchestrator::new(supervisor, layout.document_path(), window_options);

    runtime.block_on(async move {
        if let Err(e) = orchestrator.on_ready(&HeadlessPresenter) {
            orchestrator.on_will_quit();
            return Err(e.into());
        }

        tracing::info!("Running without a window; press Ctrl+C to quit");
        let signal = tokio::signal::ctrl_c().await;
        orchestrator.on_will_quit();
        signal?;
        Ok(())
    })
}
