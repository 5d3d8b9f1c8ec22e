use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use wasm_bindgen::closure::{Closure, WasmClosure};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[rustfmt::skip]
use web_sys::{
    CanvasRenderingContext2d,
    Document,
    HtmlCanvasElement,
    Response,
    UrlSearchParams,
    Window,
};

// ==================== Macros ====================
// console.log with format! arguments
macro_rules! log {
    ($($t:tt)*) => {
        web_sys::console::log_1(&format!($($t)*).into())
    }
}

// console.error with format! arguments
macro_rules! error {
    ($($t:tt)*) => {
        web_sys::console::error_1(&format!($($t)*).into())
    }
}

// ==================== Constants ====================
// Constants related to HTML elements
mod html {
    pub const CANVAS_ID: &str = "canvas";
    pub const CANVAS_TAG: &str = "canvas";
    pub const CONTEXT_2D: &str = "2d";
}

pub type LoopClosure = Closure<dyn FnMut(f64)>;

// ==================== DOM access ====================
pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(html::CANVAS_ID)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{:#?}'", html::CANVAS_ID))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn context() -> Result<CanvasRenderingContext2d> {
    context_for(&canvas()?)
}

/// 2d context of any canvas, on-screen or offscreen
pub fn context_for(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
    canvas
        .get_context(html::CONTEXT_2D)
        // Result<Option<Object>, JsValue> :
        // - map the JsValue error into anyhow
        // - map the None case into an error as well
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

/// Detached canvas used as a render target for procedural textures
pub fn create_canvas(width: u32, height: u32) -> Result<HtmlCanvasElement> {
    let canvas = document()?
        .create_element(html::CANVAS_TAG)
        .map_err(|err| anyhow!("Could not create canvas element : {:#?}", err))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))?;
    canvas.set_width(width);
    canvas.set_height(height);
    Ok(canvas)
}

/// Reads `name` from the page's query string, e.g. `?scene=dash`
pub fn query_param(name: &str) -> Result<Option<String>> {
    let search = window()?
        .location()
        .search()
        .map_err(|err| anyhow!("Could not read location.search : {:#?}", err))?;
    let params = UrlSearchParams::new_with_str(&search)
        .map_err(|err| anyhow!("Could not parse query string : {:#?}", err))?;
    Ok(params.get(name))
}

// ==================== Time & animation frames ====================
pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame {:#?}", err))
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    closure_wrap(Box::new(f))
}

// ==================== Closures & futures ====================
pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

// ==================== Fetch ====================
pub async fn fetch_json<T>(json_path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let resp_value = fetch_with_str(json_path).await?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    if !resp.ok() {
        return Err(anyhow!(
            "fetching [{}] returned status {}",
            json_path,
            resp.status()
        ));
    }
    let json = resp
        .json()
        .map_err(|err| anyhow!("Could not get JSON from response [{:#?}]", err))?;

    let json_value = JsFuture::from(json)
        .await
        .map_err(|err| anyhow!("error fetching [{:#?}]", err))?;

    serde_wasm_bindgen::from_value(json_value)
        .map_err(|err| anyhow!("error converting response : {:#?}", err))
}

async fn fetch_with_str(resource: &str) -> Result<JsValue> {
    let resp = window()?.fetch_with_str(resource);

    JsFuture::from(resp)
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))
}

// ==================== Globals ====================
/// Publishes `value` as a plain object on `window[name]` so an external
/// harness can poll it. Maps become objects, not JS `Map`s.
pub fn publish_global<T: Serialize + ?Sized>(name: &str, value: &T) -> Result<()> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    let js_value = value
        .serialize(&serializer)
        .map_err(|err| anyhow!("Could not serialize '{}' : {:#?}", name, err))?;
    let window = window()?;
    js_sys::Reflect::set(&window, &JsValue::from_str(name), &js_value)
        .map_err(|err| anyhow!("Could not set window.{} : {:#?}", name, err))?;
    Ok(())
}
