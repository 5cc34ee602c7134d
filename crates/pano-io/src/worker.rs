//! Web worker client for off-main-thread normalization.
//!
//! [`NormalizeWorker`] wraps a `web_sys::Worker` running the
//! `pano-worker` WASM module. Each [`run`](NormalizeWorker::run) call
//! gets its own request id; replies are routed back to the caller that
//! owns that id, so several uploads can be in flight at once and
//! finish in any order.
//!
//! The worker is created from embedded JS + WASM blobs, so no extra
//! static files need to be served.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use pano_pipeline::{NormalizeConfig, NormalizeError, Normalized, NormalizedMeta};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

type Reply = Result<Normalized, NormalizeError>;

/// A request waiting for its reply.
struct InFlight {
    resolve: js_sys::Function,
    reply: Rc<RefCell<Option<Reply>>>,
}

impl InFlight {
    fn finish(self, reply: Reply) {
        *self.reply.borrow_mut() = Some(reply);
        self.resolve.call0(&JsValue::NULL).ok();
    }
}

type InFlightMap = Rc<RefCell<HashMap<u64, InFlight>>>;

/// A response message from the worker, with the JS values pulled out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkerReply {
    pub ok: bool,
    pub encoded_bytes: Option<Vec<u8>>,
    pub meta_json: Option<String>,
    pub error_json: Option<String>,
}

impl WorkerReply {
    /// Read a response object posted by the worker, returning its
    /// request id alongside.
    #[must_use]
    pub fn from_js(data: &JsValue) -> (Option<u64>, Self) {
        let get = |key: &str| js_sys::Reflect::get(data, &JsValue::from_str(key)).ok();
        let request_id = get("requestId").and_then(|v| v.as_f64()).and_then(request_id_from_f64);
        let reply = Self {
            ok: get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
            encoded_bytes: get("encodedBytes")
                .and_then(|v| v.dyn_into::<js_sys::Uint8Array>().ok())
                .map(|a| a.to_vec()),
            meta_json: get("metaJson").and_then(|v| v.as_string()),
            error_json: get("errorJson").and_then(|v| v.as_string()),
        };
        (request_id, reply)
    }

    /// Rebuild the normalization result the worker computed.
    ///
    /// A worker failure deserializes to the same [`NormalizeError`] an
    /// inline run would have returned. Malformed replies become
    /// [`NormalizeError::WorkerUnavailable`].
    pub fn into_result(self) -> Reply {
        if !self.ok {
            let json = self
                .error_json
                .ok_or_else(|| malformed("error reply without errorJson"))?;
            let error: NormalizeError = serde_json::from_str(&json)
                .map_err(|e| malformed(&format!("unreadable errorJson: {e}")))?;
            return Err(error);
        }
        let bytes = self
            .encoded_bytes
            .ok_or_else(|| malformed("reply without encodedBytes"))?;
        let json = self.meta_json.ok_or_else(|| malformed("reply without metaJson"))?;
        let meta: NormalizedMeta = serde_json::from_str(&json)
            .map_err(|e| malformed(&format!("unreadable metaJson: {e}")))?;
        Ok(meta.with_bytes(bytes))
    }
}

fn malformed(detail: &str) -> NormalizeError {
    NormalizeError::WorkerUnavailable(format!("malformed worker reply: {detail}"))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn request_id_from_f64(value: f64) -> Option<u64> {
    (value >= 0.0 && value.fract() == 0.0).then(|| value as u64)
}

/// Runs [`pano_pipeline::normalize`] in a dedicated web worker.
///
/// Create one at startup and reuse it for all uploads. Dropping it
/// terminates the worker; requests still in flight resolve to
/// [`NormalizeError::WorkerUnavailable`].
pub struct NormalizeWorker {
    inner: web_sys::Worker,
    in_flight: InFlightMap,
    next_id: Cell<u64>,
    _onmessage: Closure<dyn FnMut(web_sys::MessageEvent)>,
    _onerror: Closure<dyn FnMut(web_sys::ErrorEvent)>,
}

impl NormalizeWorker {
    /// Start a worker from embedded JS glue and WASM binary.
    ///
    /// # Errors
    ///
    /// Returns the browser error if the Blob URLs or the `Worker`
    /// cannot be created.
    pub fn new(worker_js: &str, worker_wasm: &[u8]) -> Result<Self, JsValue> {
        let inner = create_worker(worker_js, worker_wasm)?;
        let in_flight: InFlightMap = Rc::default();

        let routes = Rc::clone(&in_flight);
        let onmessage = Closure::<dyn FnMut(web_sys::MessageEvent)>::new(
            move |event: web_sys::MessageEvent| {
                let (request_id, reply) = WorkerReply::from_js(&event.data());
                let Some(request_id) = request_id else {
                    tracing::warn!("worker reply without a request id");
                    return;
                };
                // Take the entry before resolving so the borrow is released.
                let waiting = routes.borrow_mut().remove(&request_id);
                match waiting {
                    Some(waiting) => waiting.finish(reply.into_result()),
                    None => tracing::warn!(request_id, "worker reply for unknown request"),
                }
            },
        );

        let routes = Rc::clone(&in_flight);
        let onerror =
            Closure::<dyn FnMut(web_sys::ErrorEvent)>::new(move |event: web_sys::ErrorEvent| {
                let message = event.message();
                tracing::warn!(%message, "normalize worker failed");
                fail_all(&routes, &format!("worker error: {message}"));
            });

        inner.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        inner.set_onerror(Some(onerror.as_ref().unchecked_ref()));

        Ok(Self {
            inner,
            in_flight,
            next_id: Cell::new(1),
            _onmessage: onmessage,
            _onerror: onerror,
        })
    }

    /// Normalize `image_bytes` in the worker.
    ///
    /// # Errors
    ///
    /// Whatever [`pano_pipeline::normalize`] returns for this input, or
    /// [`NormalizeError::WorkerUnavailable`] if the worker cannot take
    /// the request or dies before answering.
    #[allow(clippy::future_not_send)] // WASM is single-threaded; Send is not needed
    pub async fn run(&self, image_bytes: &[u8], config: &NormalizeConfig) -> Reply {
        let request_id = self.next_id.get();
        self.next_id.set(request_id + 1);
        let message = request_message(image_bytes, config, request_id)?;

        let (promise, resolve) = new_promise();
        let reply = Rc::new(RefCell::new(None));
        self.in_flight.borrow_mut().insert(
            request_id,
            InFlight {
                resolve,
                reply: Rc::clone(&reply),
            },
        );

        if self.inner.post_message(&message).is_err() {
            self.in_flight.borrow_mut().remove(&request_id);
            return Err(NormalizeError::WorkerUnavailable(
                "failed to postMessage".into(),
            ));
        }
        tracing::debug!(request_id, bytes = image_bytes.len(), "posted normalize request");

        // Yields to the browser event loop until the reply handler resolves.
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;

        reply.borrow_mut().take().unwrap_or_else(|| {
            Err(NormalizeError::WorkerUnavailable(format!(
                "worker finished request {request_id} without a result"
            )))
        })
    }
}

impl Drop for NormalizeWorker {
    fn drop(&mut self) {
        self.inner.set_onmessage(None);
        self.inner.set_onerror(None);
        self.inner.terminate();
        fail_all(&self.in_flight, "worker was shut down");
    }
}

fn fail_all(in_flight: &InFlightMap, reason: &str) {
    let waiting: Vec<_> = in_flight.borrow_mut().drain().map(|(_, w)| w).collect();
    for request in waiting {
        request.finish(Err(NormalizeError::WorkerUnavailable(reason.to_owned())));
    }
}

/// `{ imageBytes: Uint8Array, configJson: string, requestId: number }`
#[allow(clippy::cast_precision_loss)]
fn request_message(
    image_bytes: &[u8],
    config: &NormalizeConfig,
    request_id: u64,
) -> Result<js_sys::Object, NormalizeError> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| NormalizeError::InvalidConfig(format!("failed to serialize config: {e}")))?;

    let message = js_sys::Object::new();
    let set = |key: &str, value: &JsValue| {
        js_sys::Reflect::set(&message, &JsValue::from_str(key), value)
            .map(|_| ())
            .map_err(|_| NormalizeError::WorkerUnavailable(format!("failed to set {key}")))
    };
    set("imageBytes", &js_sys::Uint8Array::from(image_bytes))?;
    set("configJson", &JsValue::from_str(&config_json))?;
    set("requestId", &JsValue::from_f64(request_id as f64))?;
    Ok(message)
}

/// Create a web worker from embedded JS glue and WASM binary.
///
/// 1. Creates a Blob URL for the WASM binary
/// 2. Wraps the JS glue in a script that initializes from that URL
/// 3. Creates a Worker from a Blob URL of the wrapper
fn create_worker(worker_js: &str, worker_wasm: &[u8]) -> Result<web_sys::Worker, JsValue> {
    let wasm_array = js_sys::Uint8Array::from(worker_wasm);
    let wasm_parts = js_sys::Array::new();
    wasm_parts.push(&wasm_array.buffer());
    let wasm_opts = web_sys::BlobPropertyBag::new();
    wasm_opts.set_type("application/wasm");
    let wasm_blob =
        web_sys::Blob::new_with_buffer_source_sequence_and_options(&wasm_parts, &wasm_opts)?;
    let wasm_url = web_sys::Url::create_object_url_with_blob(&wasm_blob)?;

    let wrapper_js = format!(
        r#"{worker_js}

wasm_bindgen("{wasm_url}")
    .catch(function(e) {{ console.error("Worker WASM init failed:", e); }});
"#
    );

    let js_parts = js_sys::Array::new();
    js_parts.push(&JsValue::from_str(&wrapper_js));
    let js_opts = web_sys::BlobPropertyBag::new();
    js_opts.set_type("application/javascript");
    let js_blob = web_sys::Blob::new_with_str_sequence_and_options(&js_parts, &js_opts)?;
    let js_url = web_sys::Url::create_object_url_with_blob(&js_blob)?;

    let worker = web_sys::Worker::new(&js_url)?;

    // The wrapper has been fetched; the WASM URL stays alive because
    // the worker's async init may still be loading it.
    web_sys::Url::revoke_object_url(&js_url).ok();

    Ok(worker)
}

/// A JS Promise and its resolve function.
fn new_promise() -> (js_sys::Promise, js_sys::Function) {
    let resolve = Rc::new(RefCell::new(None::<js_sys::Function>));
    let captured = Rc::clone(&resolve);
    let promise = js_sys::Promise::new(&mut move |res, _rej| {
        *captured.borrow_mut() = Some(res);
    });
    let resolve_fn = resolve
        .borrow_mut()
        .take()
        .expect_throw("resolve not captured");
    (promise, resolve_fn)
}
