//! Playground HTTP server.
//!
//! | Route          | Method | Response                                   |
//! |----------------|--------|--------------------------------------------|
//! | `/`            | GET    | playground page                            |
//! | `/compile`     | POST   | body becomes the input, compile triggered  |
//! | `/status`      | GET    | output panel as JSON                       |
//! | `/export`      | GET    | output panel as a file download            |

mod lifecycle;
mod response;

use crate::{
    actor::WorkflowHandle,
    config::{PlaygroundConfig, WatchdogMode},
    core::is_shutdown,
    editor::Editor,
    embed::serve::{PLAYGROUND_HTML, PlaygroundVars},
    log,
};
use anyhow::{Context, Result};
use crossbeam::channel;
use std::sync::Arc;
use tiny_http::{Method, Request, Server};

/// Request handler threads.
const HANDLER_THREADS: usize = 4;

/// Per-server state shared by request handlers.
struct ServeState {
    workflow: WorkflowHandle,
    page: String,
    export_filename: String,
}

/// Resolved request target.
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Page,
    Compile,
    Status,
    Export,
    MethodNotAllowed(&'static str),
    NotFound,
}

/// Run `tbplay serve` until Ctrl+C.
pub fn serve(config: &PlaygroundConfig) -> Result<()> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    let editor = Editor::with_sample().with_detailed_errors(config.workflow.detailed_errors);
    let (workflow, runtime) = lifecycle::spawn_workflow_runtime(
        editor,
        super::build_compiler(config),
        config.workflow.clone(),
        shutdown_rx,
    )?;

    let state = Arc::new(ServeState {
        workflow,
        page: render_page(config),
        export_filename: config.export.filename.clone(),
    });

    log!("serve"; "http://{}", addr);
    run_request_loop(&server, &state)?;
    lifecycle::wait_for_shutdown(runtime);
    Ok(())
}

fn render_page(config: &PlaygroundConfig) -> String {
    PLAYGROUND_HTML.render(&PlaygroundVars {
        title: "Timeblok Playground",
        version: env!("CARGO_PKG_VERSION"),
        watchdog_ms: config.workflow.watchdog_ms,
        late_results: config.workflow.watchdog == WatchdogMode::Advisory,
        export_filename: config.export.filename.clone(),
    })
}

fn run_request_loop(server: &Server, state: &Arc<ServeState>) -> Result<()> {
    // Pool keeps a blocked trigger from stalling other requests
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(HANDLER_THREADS)
        .build()
        .context("Failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let state = Arc::clone(state);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &state) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, state: &ServeState) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    match route(request.method(), request.url()) {
        Route::Page => response::respond_page(request, &state.page),
        Route::Compile => response::respond_compile(request, &state.workflow),
        Route::Status => response::respond_status(request, &state.workflow),
        Route::Export => {
            response::respond_export(request, &state.workflow, &state.export_filename)
        }
        Route::MethodNotAllowed(allow) => response::respond_method_not_allowed(request, allow),
        Route::NotFound => response::respond_not_found(request),
    }
}

fn route(method: &Method, url: &str) -> Route {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let reading = matches!(method, Method::Get | Method::Head);

    match path {
        "/" | "/index.html" if reading => Route::Page,
        "/status" if reading => Route::Status,
        "/export" if reading => Route::Export,
        "/compile" if *method == Method::Post => Route::Compile,
        "/" | "/index.html" | "/status" | "/export" => Route::MethodNotAllowed("GET, HEAD"),
        "/compile" => Route::MethodNotAllowed("POST"),
        _ => Route::NotFound,
    }
}
