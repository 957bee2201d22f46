use anyhow::{anyhow, Result};
use futures::channel::oneshot::channel;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use wasm_bindgen::closure::{Closure, WasmClosure, WasmClosureFnOnce};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[rustfmt::skip]
use web_sys::{
    Document,
    Element,
    HtmlElement,
    IntersectionObserver,
    IntersectionObserverEntry,
    IntersectionObserverInit,
    Response,
    Window,
};

// ==================== Logging ====================
// console on wasm, stderr on native targets (web-sys has no console there)
macro_rules! log {
    ($($t:tt)*) => {
        $crate::browser::console_log(&format!($($t)*))
    }
}

macro_rules! error {
    ($($t:tt)*) => {
        $crate::browser::console_error(&format!($($t)*))
    }
}

pub fn console_log(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{}", message);
}

pub fn console_error(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("ERROR: {}", message);
}

// ==================== Lookups ====================
pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn element_by_id(id: &str) -> Result<Element> {
    document()?
        .get_element_by_id(id)
        .ok_or_else(|| anyhow!("No Element found with ID : '{}'", id))
}

pub fn query(scope: &Element, selector: &str) -> Result<Element> {
    scope
        .query_selector(selector)
        .map_err(|err| anyhow!("Invalid selector '{}' : {:#?}", selector, err))?
        .ok_or_else(|| anyhow!("No Element matching '{}'", selector))
}

pub fn query_document(selector: &str) -> Result<Element> {
    document()?
        .query_selector(selector)
        .map_err(|err| anyhow!("Invalid selector '{}' : {:#?}", selector, err))?
        .ok_or_else(|| anyhow!("No Element matching '{}'", selector))
}

/// Every element matching `selector`, in document order.
pub fn query_all(selector: &str) -> Result<Vec<Element>> {
    let list = document()?
        .query_selector_all(selector)
        .map_err(|err| anyhow!("Invalid selector '{}' : {:#?}", selector, err))?;
    Ok((0..list.length())
        .filter_map(|index| list.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}

pub fn body() -> Result<Element> {
    document()?
        .body()
        .map(Element::from)
        .ok_or_else(|| anyhow!("No Body Found"))
}

pub fn as_html(element: &Element) -> Result<&HtmlElement> {
    element
        .dyn_ref::<HtmlElement>()
        .ok_or_else(|| anyhow!("Element '{}' is not an HtmlElement", element.id()))
}

pub fn create_element(tag: &str) -> Result<Element> {
    document()?
        .create_element(tag)
        .map_err(|err| anyhow!("Could not create '{}' element : {:#?}", tag, err))
}

/// Inner viewport size in CSS pixels.
pub fn viewport_size() -> Result<(f64, f64)> {
    let window = window()?;
    let width = window
        .inner_width()
        .map_err(|err| anyhow!("Could not read innerWidth : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("innerWidth is not a number"))?;
    let height = window
        .inner_height()
        .map_err(|err| anyhow!("Could not read innerHeight : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("innerHeight is not a number"))?;
    Ok((width, height))
}

// ==================== Closures & Timers ====================
pub fn closure_once<F, A, R>(f: F) -> Closure<F::FnMut>
where
    F: 'static + WasmClosureFnOnce<A, R>,
{
    Closure::once(f)
}

pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

/// Run `callback` once after `delay_ms`. The closure is leaked until it fires.
pub fn set_timeout(delay_ms: u32, callback: impl FnOnce() + 'static) -> Result<i32> {
    let closure = closure_once(callback);
    let handle = window()?
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            i32::try_from(delay_ms).unwrap_or(i32::MAX),
        )
        .map_err(|err| anyhow!("setTimeout failed : {:#?}", err))?;
    closure.forget();
    Ok(handle)
}

/// Resolve after `delay_ms`, backed by `setTimeout`.
pub async fn sleep(delay_ms: u32) -> Result<()> {
    let (tx, rx) = channel::<()>();
    let tx = Rc::new(RefCell::new(Some(tx)));
    set_timeout(delay_ms, move || {
        if let Some(tx) = tx.borrow_mut().take() {
            let _ = tx.send(());
        }
    })?;
    rx.await
        .map_err(|_| anyhow!("timer for {}ms was dropped", delay_ms))
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

// ==================== Host events ====================
/// Calls `on_offset` with `scrollTop` whenever `container` scrolls.
pub fn on_scroll(container: &Element, mut on_offset: impl FnMut(f64) + 'static) -> Result<()> {
    let target = container.clone();
    let closure = closure_wrap(Box::new(move || {
        on_offset(f64::from(target.scroll_top()));
    }) as Box<dyn FnMut()>);
    container
        .add_event_listener_with_callback("scroll", closure.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Could not listen for scroll : {:#?}", err))?;
    closure.forget();
    Ok(())
}

/// Observes `sections`, reporting `(id, is_intersecting, ratio)` per entry.
pub fn observe_intersections(
    sections: &[Element],
    threshold: f64,
    root_margin: &str,
    mut on_entry: impl FnMut(&Element, bool, f64) + 'static,
) -> Result<IntersectionObserver> {
    let closure = closure_wrap(Box::new(
        move |entries: js_sys::Array, _observer: IntersectionObserver| {
            for entry in entries.iter() {
                if let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() {
                    on_entry(
                        &entry.target(),
                        entry.is_intersecting(),
                        entry.intersection_ratio(),
                    );
                }
            }
        },
    ) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

    let options = IntersectionObserverInit::new();
    options.set_threshold(&JsValue::from_f64(threshold));
    options.set_root_margin(root_margin);

    let observer =
        IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &options)
            .map_err(|err| anyhow!("Could not create IntersectionObserver : {:#?}", err))?;
    closure.forget();

    for section in sections {
        observer.observe(section);
    }
    Ok(observer)
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
        return Err(anyhow!("fetching {} returned status {}", json_path, resp.status()));
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
