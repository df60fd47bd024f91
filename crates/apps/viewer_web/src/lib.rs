use console_error_panic_hook::set_once;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use foundation::bounds::Aabb3;
use scene::camera::{Camera, FramingPolicy, STATIC_ASSET_SCALE};
use scene::visibility::group_by_name;
use serde::Serialize;
use settings::{InMemorySettingsStore, LocalStorageSettingsStore, SettingsStore};

pub mod map;
pub mod session;
pub mod ui;

use session::Session;

thread_local! {
    static SESSION: Rc<RefCell<Session>> =
        Rc::new(RefCell::new(Session::new(default_settings_store())));
    static ON_UPDATE: RefCell<Option<js_sys::Function>> = const { RefCell::new(None) };
}

fn default_settings_store() -> Box<dyn SettingsStore> {
    match LocalStorageSettingsStore::new() {
        Ok(store) => Box::new(store),
        Err(err) => {
            log(&format!("settings unavailable ({err}), using memory"));
            Box::new(InMemorySettingsStore::new())
        }
    }
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn with_session<R>(f: impl FnOnce(&Session) -> R) -> R {
    SESSION.with(|s| f(&s.borrow()))
}

fn with_session_mut<R>(f: impl FnOnce(&mut Session) -> R) -> R {
    SESSION.with(|s| f(&mut s.borrow_mut()))
}

/// Tells the page to re-read status, meshes and camera.
#[cfg(target_arch = "wasm32")]
fn notify() {
    ON_UPDATE.with(|cb| {
        if let Some(callback) = cb.borrow().as_ref()
            && let Err(err) = callback.call0(&JsValue::NULL)
        {
            web_sys::console::error_1(&err);
        }
    });
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

#[wasm_bindgen]
pub fn set_on_update(callback: js_sys::Function) {
    ON_UPDATE.with(|cb| *cb.borrow_mut() = Some(callback));
}

#[wasm_bindgen]
pub fn compute_url() -> String {
    with_session(|s| s.endpoint_url().to_string())
}

#[wasm_bindgen]
pub fn set_compute_url(url: &str) {
    with_session_mut(|s| s.set_endpoint_url(url));
}

#[wasm_bindgen]
pub fn set_api_key(key: &str) {
    with_session_mut(|s| s.set_api_key(key));
}

#[wasm_bindgen]
pub fn set_definition_path(path: &str) {
    with_session_mut(|s| s.set_definition_path(path));
}

#[wasm_bindgen]
pub fn format_slider_integer(value: f64) -> String {
    ui::format_integer(value)
}

#[wasm_bindgen]
pub fn format_slider_one_decimal(value: f64) -> String {
    ui::format_one_decimal(value)
}

/// Evaluates the definition with slider values `A` and `B`.
///
/// Validation happens before this returns, so the status line already shows
/// either the first progress message or the configuration error.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn run_evaluation(a: f64, b: f64) {
    use compute::transport::BrowserTransport;
    use formats::kernel::NativeKernel;
    use formats::protocol::Param;
    use wasm_bindgen_futures::spawn_local;

    let pending = with_session_mut(|s| s.begin_run());
    notify();
    let Ok(pending) = pending else {
        return;
    };

    spawn_local(async move {
        let session = SESSION.with(Rc::clone);
        let params = [Param::number("A", a), Param::number("B", b)];
        let outcome = session::execute_pending(
            &session,
            pending,
            BrowserTransport,
            &params,
            &NativeKernel::new(),
        )
        .await;
        if outcome == session::RunOutcome::Failed {
            let msg = session.borrow().status_message().to_string();
            web_sys::console::error_1(&JsValue::from_str(&msg));
        }
        notify();
    });
}

#[wasm_bindgen]
pub fn status_text() -> String {
    with_session(|s| s.status_message().to_string())
}

#[wasm_bindgen]
pub fn status_is_error() -> bool {
    with_session(|s| s.status_is_error())
}

#[wasm_bindgen]
pub fn is_busy() -> bool {
    with_session(|s| s.is_busy())
}

#[wasm_bindgen]
pub fn object_count() -> usize {
    with_session(|s| s.world().len())
}

#[wasm_bindgen]
pub fn object_name(index: usize) -> Option<String> {
    with_session(|s| s.object(index).and_then(|o| o.name.clone()))
}

#[wasm_bindgen]
pub fn object_positions(index: usize) -> Result<js_sys::Float32Array, JsValue> {
    with_session(|s| {
        let obj = s
            .object(index)
            .ok_or_else(|| js_err(format!("no object {index}")))?;
        Ok(js_sys::Float32Array::from(obj.mesh.positions.as_slice()))
    })
}

#[wasm_bindgen]
pub fn object_normals(index: usize) -> Result<js_sys::Float32Array, JsValue> {
    with_session(|s| {
        let obj = s
            .object(index)
            .ok_or_else(|| js_err(format!("no object {index}")))?;
        Ok(js_sys::Float32Array::from(obj.mesh.normals.as_slice()))
    })
}

#[wasm_bindgen]
pub fn object_visible(index: usize) -> bool {
    with_session(|s| s.object(index).is_some_and(|o| o.visibility.visible))
}

#[wasm_bindgen]
pub fn set_object_visible(index: usize, visible: bool) -> bool {
    with_session_mut(|s| s.set_object_visible(index, visible))
}

#[wasm_bindgen]
pub fn toggle_count() -> usize {
    with_session(|s| s.toggles().len())
}

#[wasm_bindgen]
pub fn toggle_label(index: usize) -> Option<String> {
    with_session(|s| s.toggles().get(index).map(|t| t.label.clone()))
}

#[wasm_bindgen]
pub fn set_toggle_visible(index: usize, visible: bool) -> bool {
    with_session_mut(|s| s.set_toggle_visible(index, visible))
}

fn camera_values(camera: &Camera) -> Vec<f64> {
    vec![
        camera.position.x,
        camera.position.y,
        camera.position.z,
        camera.target.x,
        camera.target.y,
        camera.target.z,
        camera.fov_deg,
        camera.near,
        camera.far,
    ]
}

/// `[px, py, pz, tx, ty, tz, fov_deg, near, far]`.
#[wasm_bindgen]
pub fn camera_state() -> Vec<f64> {
    with_session(|s| camera_values(s.camera()))
}

/// `[px, py, pz, tx, ty, tz, fov_deg, near, far]` of the static asset viewer
/// before anything is framed.
#[wasm_bindgen]
pub fn static_asset_camera() -> Vec<f64> {
    camera_values(&Camera::static_asset_viewer())
}

#[wasm_bindgen]
pub fn static_asset_scale() -> f64 {
    STATIC_ASSET_SCALE
}

/// Framing for the already scaled static asset bounds: `[px, py, pz, tx, ty,
/// tz]`, or empty when the bounds are empty.
#[wasm_bindgen]
pub fn frame_static_asset(
    min: Vec<f64>,
    max: Vec<f64>,
    fov_deg: f64,
) -> Result<Vec<f64>, JsValue> {
    let (Ok(min), Ok(max)) = (<[f64; 3]>::try_from(min), <[f64; 3]>::try_from(max)) else {
        return Err(js_err("bounds corners need three components"));
    };
    let framing = FramingPolicy::static_asset().frame(&Aabb3::new(min, max), fov_deg);
    Ok(framing
        .map(|f| {
            vec![
                f.position.x,
                f.position.y,
                f.position.z,
                f.target.x,
                f.target.y,
                f.target.z,
            ]
        })
        .unwrap_or_default())
}

#[derive(Serialize)]
struct ToggleGroup {
    label: String,
    members: Vec<usize>,
}

/// Groups the static asset's meshes by name. Takes a JSON array of names
/// (`null` for unnamed) and returns `[{label, members}]` as JSON.
#[wasm_bindgen]
pub fn static_asset_toggles(names_json: &str) -> Result<String, JsValue> {
    let names: Vec<Option<String>> = serde_json::from_str(names_json).map_err(js_err)?;
    let groups: Vec<ToggleGroup> = group_by_name(names.iter().map(|n| n.as_deref()))
        .into_iter()
        .map(|(label, members)| ToggleGroup { label, members })
        .collect();
    serde_json::to_string(&groups).map_err(js_err)
}

#[wasm_bindgen]
pub fn map_style_json() -> String {
    map::map_style().to_string()
}

#[wasm_bindgen]
pub fn map_initial_view_json() -> Result<String, JsValue> {
    serde_json::to_string(&map::MapView::default()).map_err(js_err)
}

#[wasm_bindgen]
pub fn map_layers_json() -> String {
    serde_json::Value::Array(map::data_layers(map::DATA_SOURCE_ID)).to_string()
}

#[wasm_bindgen]
pub fn map_source_id() -> String {
    map::DATA_SOURCE_ID.to_string()
}

#[wasm_bindgen]
pub fn map_fit_options_json() -> Result<String, JsValue> {
    serde_json::to_string(&map::FitOptions::default()).map_err(js_err)
}

/// `[west, south, east, north]`, or empty when the data has no coordinates.
#[wasm_bindgen]
pub fn map_fit_bounds(geojson: &str) -> Result<Vec<f64>, JsValue> {
    let value: serde_json::Value = serde_json::from_str(geojson).map_err(js_err)?;
    Ok(map::fit_bounds(&value)
        .map(|[[w, s], [e, n]]| vec![w, s, e, n])
        .unwrap_or_default())
}

/// `{name, height}` for a clicked building's properties.
#[wasm_bindgen]
pub fn building_popup_json(properties: &str) -> Result<String, JsValue> {
    let props: serde_json::Value = serde_json::from_str(properties).map_err(js_err)?;
    let (name, height) = map::building_popup(&props);
    Ok(serde_json::json!({ "name": name, "height": height }).to_string())
}
