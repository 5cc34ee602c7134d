//! Web worker entry point for panorama normalization.
//!
//! Compiles to a standalone WASM module that runs inside a `Worker`.
//! It receives source bytes and a `NormalizeConfig` via `postMessage`,
//! calls [`pano_pipeline::normalize`], and posts the result back.
//!
//! The encoded image travels as a raw `Uint8Array`; everything else
//! about the result is a small [`pano_pipeline::NormalizedMeta`] JSON
//! string.

use pano_pipeline::{NormalizeConfig, NormalizeError, Normalized};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Message protocol: the main thread sends a JS object with:
/// - `imageBytes`: `Uint8Array` with the raw uploaded file
/// - `configJson`: `String`, a JSON-serialized `NormalizeConfig`
/// - `requestId`: `f64`, echoed in the response
///
/// On success the worker responds with:
/// - `requestId`: `f64`
/// - `ok`: `true`
/// - `encodedBytes`: `Uint8Array`, the normalized image file
/// - `metaJson`: `String`, a JSON-serialized `NormalizedMeta`
///
/// On error:
/// - `requestId`: `f64`
/// - `ok`: `false`
/// - `errorJson`: `String`, a JSON-serialized `NormalizeError`
///
/// Requests are answered in arrival order; the main thread matches
/// responses by `requestId`.
#[wasm_bindgen(start)]
pub fn worker_main() {
    console_error_panic_hook::set_once();

    let global: web_sys::DedicatedWorkerGlobalScope = js_sys::global()
        .dyn_into()
        .expect_throw("not running in a DedicatedWorkerGlobalScope");

    let onmessage =
        Closure::<dyn FnMut(web_sys::MessageEvent)>::new(move |event: web_sys::MessageEvent| {
            handle_message(&event);
        });
    global.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget(); // lives for the worker lifetime
}

fn field(data: &JsValue, name: &str) -> JsValue {
    js_sys::Reflect::get(data, &JsValue::from_str(name)).unwrap_or(JsValue::UNDEFINED)
}

fn handle_message(event: &web_sys::MessageEvent) {
    let data = event.data();

    // Without a request id nobody can be answered; drop the message.
    let Some(request_id) = field(&data, "requestId").as_f64() else {
        return;
    };

    let Ok(image_bytes) = field(&data, "imageBytes").dyn_into::<js_sys::Uint8Array>() else {
        post_error(
            request_id,
            &NormalizeError::InvalidConfig("imageBytes is not a Uint8Array".into()),
        );
        return;
    };
    let image_bytes = image_bytes.to_vec();

    let config = match parse_config(&field(&data, "configJson")) {
        Ok(config) => config,
        Err(e) => {
            post_error(request_id, &e);
            return;
        }
    };

    // Synchronous: blocks this worker thread only.
    match pano_pipeline::normalize(&image_bytes, &config) {
        Ok(normalized) => post_success(request_id, normalized),
        Err(e) => post_error(request_id, &e),
    }
}

fn parse_config(value: &JsValue) -> Result<NormalizeConfig, NormalizeError> {
    let json = value
        .as_string()
        .ok_or_else(|| NormalizeError::InvalidConfig("configJson is not a string".into()))?;
    serde_json::from_str(&json)
        .map_err(|e| NormalizeError::InvalidConfig(format!("failed to parse config: {e}")))
}

#[allow(clippy::expect_used)]
fn post_success(request_id: f64, normalized: Normalized) {
    let (bytes, meta) = normalized.into_parts();
    let meta_json = match serde_json::to_string(&meta) {
        Ok(json) => json,
        Err(e) => {
            post_error(
                request_id,
                &NormalizeError::Encode(format!("failed to serialize result metadata: {e}")),
            );
            return;
        }
    };

    let response = js_sys::Object::new();
    let set = |key: &str, val: &JsValue| {
        js_sys::Reflect::set(&response, &JsValue::from_str(key), val)
            .expect_throw("failed to set response field");
    };
    set("requestId", &JsValue::from_f64(request_id));
    set("ok", &JsValue::from_bool(true));
    set("encodedBytes", &js_sys::Uint8Array::from(bytes.as_slice()));
    set("metaJson", &JsValue::from_str(&meta_json));

    let global: web_sys::DedicatedWorkerGlobalScope = js_sys::global()
        .dyn_into()
        .expect_throw("not in worker scope");
    global
        .post_message(&response)
        .expect_throw("failed to postMessage");
}

fn post_error(request_id: f64, error: &NormalizeError) {
    let error_json = serde_json::to_string(error)
        .unwrap_or_else(|e| format!("{{\"WorkerUnavailable\":\"serialization error: {e}\"}}"));

    let response = js_sys::Object::new();
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("requestId"),
        &JsValue::from_f64(request_id),
    );
    let _ = js_sys::Reflect::set(&response, &JsValue::from_str("ok"), &JsValue::from_bool(false));
    let _ = js_sys::Reflect::set(
        &response,
        &JsValue::from_str("errorJson"),
        &JsValue::from_str(&error_json),
    );

    if let Ok(global) = js_sys::global().dyn_into::<web_sys::DedicatedWorkerGlobalScope>() {
        let _ = global.post_message(&response);
    }
}
