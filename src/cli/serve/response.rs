//! HTTP response handlers.

use crate::actor::{Triggered, WorkflowError, WorkflowHandle};
use crate::utils::mime::types::{HTML, JSON, PLAIN};
use anyhow::{Result, anyhow};
use serde::Serialize;
use std::io::Read;
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// Largest accepted `/compile` body.
const MAX_SOURCE_BYTES: u64 = 1024 * 1024;

/// Reply to `POST /compile`.
#[derive(Debug, Serialize)]
struct TriggerReply {
    status: &'static str,
    generation: u64,
}

impl From<Triggered> for TriggerReply {
    fn from(triggered: Triggered) -> Self {
        let status = match triggered {
            Triggered::Started { .. } => "started",
            Triggered::Ignored { .. } => "ignored",
        };
        Self {
            status,
            generation: triggered.generation(),
        }
    }
}

/// Respond with the playground page.
pub fn respond_page(request: Request, page: &str) -> Result<()> {
    if is_head_request(&request) {
        return send_head(request, 200, HTML);
    }
    send_body(request, 200, HTML, page.as_bytes().to_vec())
}

/// Replace the input with the request body and trigger a compile.
pub fn respond_compile(mut request: Request, workflow: &WorkflowHandle) -> Result<()> {
    let mut body = Vec::new();
    request
        .as_reader()
        .take(MAX_SOURCE_BYTES + 1)
        .read_to_end(&mut body)?;

    if body.len() as u64 > MAX_SOURCE_BYTES {
        return send_body(request, 413, PLAIN, b"413 Payload Too Large".to_vec());
    }
    let Ok(source) = String::from_utf8(body) else {
        return send_body(request, 400, PLAIN, b"400 Source must be UTF-8".to_vec());
    };

    workflow.set_input(source);
    match workflow.blocking_trigger() {
        Ok(triggered) => {
            crate::debug!("serve"; "compile #{} {:?}", triggered.generation(), triggered);
            send_json(request, 202, &TriggerReply::from(triggered))
        }
        Err(WorkflowError::Closed) => respond_unavailable(request),
    }
}

/// Respond with the output panel as JSON.
pub fn respond_status(request: Request, workflow: &WorkflowHandle) -> Result<()> {
    send_json(request, 200, &workflow.snapshot())
}

/// Respond with the output panel as a file download.
pub fn respond_export(request: Request, workflow: &WorkflowHandle, filename: &str) -> Result<()> {
    let file = workflow.export(filename);
    let disposition = file.content_disposition();
    let response = Response::from_data(file.bytes.clone())
        .with_status_code(StatusCode(200))
        .with_header(make_header("Content-Type", file.content_type())?)
        .with_header(make_header("Content-Disposition", &disposition)?)
        .with_header(make_header("Cache-Control", "no-store")?);
    request.respond(response)?;
    Ok(())
}

/// Respond with 404 Not Found.
pub fn respond_not_found(request: Request) -> Result<()> {
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 405 Method Not Allowed.
pub fn respond_method_not_allowed(request: Request, allow: &str) -> Result<()> {
    let response = Response::from_data(b"405 Method Not Allowed".to_vec())
        .with_status_code(StatusCode(405))
        .with_header(make_header("Content-Type", PLAIN)?)
        .with_header(make_header("Allow", allow)?);
    request.respond(response)?;
    Ok(())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &str) -> Result<()> {
    let response =
        Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type)?);
    request.respond(response)?;
    Ok(())
}

fn send_body(request: Request, status: u16, content_type: &str, body: Vec<u8>) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type)?);
    request.respond(response)?;
    Ok(())
}

fn send_json<T: Serialize>(request: Request, status: u16, value: &T) -> Result<()> {
    let body = serde_json::to_vec(value)?;
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", JSON)?)
        .with_header(make_header("Cache-Control", "no-store")?);
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid header `{key}: {value}`"))
}
