//! Native window hosting the system webview, plus the platform event loop.
//!
//! The event loop owns the main thread. Its first iteration is the
//! application "ready" signal; `LoopDestroyed` is "will quit".

use std::path::Path;

use launcher_core::error::{LauncherError, Result};
use launcher_core::settings::WindowOptions;
use launcher_runtime::orchestrator::ApplicationOrchestrator;
use launcher_runtime::presenter::{document_url, ensure_document, WindowPresenter};
use tao::dpi::LogicalSize;
use tao::event::{Event, StartCause, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use tao::window::{Window, WindowBuilder};
use tokio::runtime::Runtime;
use wry::{WebView, WebViewBuilder};

/// The open window. Dropping it closes the webview, then the window.
pub struct WebviewWindow {
    _webview: WebView,
    _window: Window,
}

/// Creates windows on a running tao event loop.
pub struct WebviewPresenter<'a> {
    target: &'a EventLoopWindowTarget<()>,
}

impl<'a> WebviewPresenter<'a> {
    pub fn new(target: &'a EventLoopWindowTarget<()>) -> Self {
        Self { target }
    }
}

impl WindowPresenter for WebviewPresenter<'_> {
    type Handle = WebviewWindow;

    fn show(&self, options: &WindowOptions, document: &Path) -> Result<WebviewWindow> {
        let document = ensure_document(document)?;
        let url = document_url(&document)?;

        let window = WindowBuilder::new()
            .with_title(&options.title)
            .with_inner_size(LogicalSize::new(
                f64::from(options.width),
                f64::from(options.height),
            ))
            .build(self.target)
            .map_err(|e| LauncherError::Window(e.to_string()))?;

        let builder = WebViewBuilder::new().with_url(url);

        #[cfg(any(
            target_os = "windows",
            target_os = "macos",
            target_os = "ios",
            target_os = "android"
        ))]
        let webview = builder.build(&window);

        // GTK platforms need the webview packed into the window's container.
        #[cfg(not(any(
            target_os = "windows",
            target_os = "macos",
            target_os = "ios",
            target_os = "android"
        )))]
        let webview = {
            use tao::platform::unix::WindowExtUnix;
            use wry::WebViewBuilderExtUnix;
            let vbox = window
                .default_vbox()
                .ok_or_else(|| LauncherError::Window("window has no GTK container".to_string()))?;
            builder.build_gtk(vbox)
        };

        let webview = webview.map_err(|e| LauncherError::Window(e.to_string()))?;

        Ok(WebviewWindow {
            _webview: webview,
            _window: window,
        })
    }
}

/// Run the platform event loop until the window is closed.
///
/// `runtime` hosts the backend output tasks and is entered around every
/// event so the supervisor can spawn onto it. Never returns.
pub fn run(mut orchestrator: ApplicationOrchestrator<WebviewWindow>, runtime: Runtime) -> ! {
    let event_loop = EventLoop::new();

    event_loop.run(move |event, target, control_flow| {
        *control_flow = ControlFlow::Wait;
        let _guard = runtime.enter();

        match event {
            Event::NewEvents(StartCause::Init) => {
                if let Err(e) = orchestrator.on_ready(&WebviewPresenter::new(target)) {
                    tracing::error!(error = %e, "cannot show UI; quitting");
                    *control_flow = ControlFlow::Exit;
                }
            }
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                *control_flow = ControlFlow::Exit;
            }
            Event::LoopDestroyed => {
                orchestrator.on_will_quit();
            }
            _ => {}
        }
    })
}
